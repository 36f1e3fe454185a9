//! 係り受け解析を実行するユーティリティ
//!
//! このバイナリは、スコアバンクまたは標準入力から読み込んだ辺スコア行列を解析し、
//! 指定された出力形式（edges、conll、detail）で結果を出力します。

use std::error::Error;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use kakari::errors::KakariError;
use kakari::score::MatrixBlocks;
use kakari::{Parser, PruneRule, ScoreBank, ScoreMatrix, Worker};

/// 出力モード
#[derive(Clone, Debug)]
enum OutputMode {
    Edges,
    Conll,
    Detail,
}

impl FromStr for OutputMode {
    type Err = &'static str;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "edges" => Ok(Self::Edges),
            "conll" => Ok(Self::Conll),
            "detail" => Ok(Self::Detail),
            _ => Err("Could not parse a mode"),
        }
    }
}

/// 枝刈り規則の指定
///
/// `adaptive`、`none`、または固定の閾値を表す実数を受け付けます。
#[derive(Clone, Debug)]
struct PruneArg(PruneRule);

impl FromStr for PruneArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adaptive" => Ok(Self(PruneRule::Adaptive)),
            "none" => Ok(Self(PruneRule::Disabled)),
            _ => s
                .parse::<f32>()
                .ok()
                .filter(|t| t.is_finite())
                .map(|t| Self(PruneRule::Fixed(t)))
                .ok_or_else(|| format!("Could not parse a pruning rule: {s}")),
        }
    }
}

/// コマンドライン引数
#[derive(clap::Parser, Debug)]
#[clap(name = "parse", about = "Predicts projective dependency trees")]
struct Args {
    /// Score bank (binary). If omitted, text matrices are read from stdin.
    #[clap(short = 'b', long)]
    bank: Option<PathBuf>,

    /// Token position used as the root of every tree.
    #[clap(short = 'r', long, default_value = "0")]
    root: usize,

    /// Pruning rule. Choices are adaptive, none, or a fixed threshold.
    #[clap(short = 'p', long, default_value = "adaptive")]
    prune: PruneArg,

    /// Maximum number of spans solved per sentence (0 means unlimited).
    #[clap(short = 'M', long, default_value = "0")]
    max_spans: usize,

    /// Time limit per sentence in milliseconds.
    #[clap(long)]
    time_limit_ms: Option<u64>,

    /// Output mode. Choices are edges, conll, and detail.
    #[clap(short = 'O', long, default_value = "edges")]
    output_mode: OutputMode,
}

/// 1文を解析し、完全な木が得られなかった場合は警告文を返します。
///
/// 探索予算の超過は空の結果として扱います。
fn parse_sentence(
    worker: &mut Worker,
    id: &str,
    scores: &ScoreMatrix,
) -> Result<Option<String>, KakariError> {
    let reason = match worker.parse(scores) {
        Ok(()) if worker.is_complete() => return Ok(None),
        Ok(()) => "incomplete tree".to_string(),
        Err(e @ KakariError::BudgetExceeded(_)) => e.to_string(),
        Err(e) => return Err(e),
    };
    Ok(Some(format!(
        "{id}: {reason} ({} arcs for {} tokens)",
        worker.num_arcs(),
        scores.num_tokens()
    )))
}

/// 1文の解析結果を書き出します。
fn write_sentence<W>(
    out: &mut W,
    worker: &mut Worker,
    id: &str,
    scores: &ScoreMatrix,
    mode: &OutputMode,
) -> Result<(), Box<dyn Error>>
where
    W: Write,
{
    if let Some(warning) = parse_sentence(worker, id, scores)? {
        log::warn!("{warning}");
    }

    writeln!(out, "# id = {id}")?;
    match mode {
        OutputMode::Edges => {
            for arc in worker.arc_iter() {
                writeln!(out, "{}\t{}\t{}", arc.head(), arc.dependent(), arc.score())?;
            }
        }
        OutputMode::Conll => {
            let tree = worker.to_tree();
            for (i, head) in tree.heads().into_iter().enumerate() {
                match head {
                    Some(h) => writeln!(out, "{}\t{}", i + 1, h + 1)?,
                    None if i == tree.root() => writeln!(out, "{}\t0", i + 1)?,
                    None => writeln!(out, "{}\t_", i + 1)?,
                }
            }
        }
        OutputMode::Detail => {
            for arc in worker.arc_iter() {
                writeln!(out, "{arc}\tscore={}", arc.score())?;
            }
            writeln!(
                out,
                "tokens={}\tarcs={}\tspans={}\tmean_score={}\tcomplete={}",
                scores.num_tokens(),
                worker.num_arcs(),
                worker.num_spans(),
                worker
                    .mean_score()
                    .map_or_else(|| "_".to_string(), |m| m.to_string()),
                worker.is_complete(),
            )?;
        }
    }
    out.write_all(b"EOS\n")?;
    Ok(())
}

/// メイン関数
///
/// スコア行列を順に解析し、指定された形式で結果を標準出力に出力します。
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    let args = <Args as clap::Parser>::parse();

    let mut parser = Parser::new()
        .root(args.root)
        .prune_rule(args.prune.0)
        .max_spans(args.max_spans);
    if let Some(ms) = args.time_limit_ms {
        parser = parser.time_limit(Duration::from_millis(ms));
    }
    let mut worker = parser.new_worker();

    let is_tty = atty::is(atty::Stream::Stdout);

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());

    if let Some(path) = args.bank {
        eprintln!("Loading the score bank...");
        let bank = ScoreBank::from_path(path)?;
        eprintln!("Ready to parse {} sentences", bank.len());
        for (id, scores) in bank.iter() {
            write_sentence(&mut out, &mut worker, id, scores, &args.output_mode)?;
        }
    } else {
        eprintln!("Ready to parse");
        for (i, block) in MatrixBlocks::new(std::io::stdin().lock()).enumerate() {
            let (id, scores) = block?;
            let id = id.unwrap_or_else(|| (i + 1).to_string());
            write_sentence(&mut out, &mut worker, &id, &scores, &args.output_mode)?;
            if is_tty {
                out.flush()?;
            }
        }
    }
    out.flush()?;

    Ok(())
}
