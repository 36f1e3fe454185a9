//! 解析精度を評価するユーティリティ
//!
//! このバイナリは、スコアバンクの各文を解析し、正解の係り先と比較して
//! 係り受け正解率（UAS）と完全な木が得られた文の割合を計算します。
//!
//! 正解ファイルの各行は `<id>\t<head> <head> ...` の形式で、
//! 根のトークンの係り先は `_` で表します。

use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use kakari::errors::KakariError;
use kakari::{Parser, PruneRule, ScoreBank};

/// コマンドライン引数
#[derive(clap::Parser, Debug)]
#[clap(name = "evaluate", about = "Evaluate the parsing accuracy")]
struct Args {
    /// Binary score bank.
    #[clap(short = 'b', long)]
    bank: PathBuf,

    /// Gold heads.
    #[clap(short = 'g', long)]
    gold: PathBuf,

    /// Disables pruning.
    #[clap(long)]
    no_prune: bool,

    /// Maximum number of spans solved per sentence (0 means unlimited).
    #[clap(short = 'M', long, default_value = "0")]
    max_spans: usize,

    /// Time limit per sentence in milliseconds.
    #[clap(long)]
    time_limit_ms: Option<u64>,
}

/// 正解データの1文
struct GoldSentence {
    id: String,
    heads: Vec<Option<usize>>,
}

impl GoldSentence {
    /// 係り先を持たないトークンがちょうど1つならその位置を返します。
    fn root(&self) -> Option<usize> {
        let mut roots = (0..self.heads.len()).filter(|&i| self.heads[i].is_none());
        let root = roots.next()?;
        roots.next().is_none().then_some(root)
    }
}

/// 正解ファイルの1行をパースする
///
/// # 戻り値
///
/// 空行の場合は `None`
fn parse_gold_line(line: &str, line_no: usize) -> Result<Option<GoldSentence>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (id, heads) = line
        .split_once('\t')
        .ok_or_else(|| format!("line {line_no}: expected <id>\\t<heads>"))?;
    let heads = heads
        .split_ascii_whitespace()
        .map(|h| match h {
            "_" => Ok(None),
            _ => h
                .parse::<usize>()
                .map(Some)
                .map_err(|e| format!("line {line_no}: invalid head {h:?}: {e}")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(GoldSentence {
        id: id.to_string(),
        heads,
    }))
}

/// メイン関数
///
/// 正解データの各文について、正解の根を使って解析し、
/// 係り先が一致したトークン数と完全な木の数を集計します。
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    let args = <Args as clap::Parser>::parse();

    eprintln!("Loading the score bank...");
    let bank = ScoreBank::from_path(&args.bank)?;

    let mut base = Parser::new().max_spans(args.max_spans);
    if args.no_prune {
        base = base.prune_rule(PruneRule::Disabled);
    }
    if let Some(ms) = args.time_limit_ms {
        base = base.time_limit(Duration::from_millis(ms));
    }

    eprintln!("Parsing...");

    let rdr = BufReader::new(File::open(&args.gold)?);
    let mut num_sentences = 0;
    let mut num_complete = 0;
    let mut num_tokens = 0;
    let mut num_correct = 0;
    for (i, line) in rdr.lines().enumerate() {
        let Some(gold) = parse_gold_line(&line?, i + 1)? else {
            continue;
        };
        let scores = bank
            .get(&gold.id)
            .ok_or_else(|| format!("sentence {:?} is not in the score bank", gold.id))?;
        if scores.num_tokens() != gold.heads.len() {
            return Err(format!(
                "sentence {:?}: {} gold heads for {} tokens",
                gold.id,
                gold.heads.len(),
                scores.num_tokens()
            )
            .into());
        }
        let root = gold
            .root()
            .ok_or_else(|| format!("sentence {:?} must have exactly one root", gold.id))?;

        let mut worker = base.clone().root(root).new_worker();
        match worker.parse(scores) {
            Ok(()) => {}
            Err(e @ KakariError::BudgetExceeded(_)) => log::warn!("{}: {e}", gold.id),
            Err(e) => return Err(e.into()),
        }
        let tree = worker.to_tree();

        num_sentences += 1;
        if tree.is_complete() {
            num_complete += 1;
        }
        // The root token carries no head and is excluded from UAS.
        num_tokens += gold.heads.len() - 1;
        num_correct += tree
            .heads()
            .iter()
            .zip(&gold.heads)
            .filter(|(sys, gold)| gold.is_some() && sys == gold)
            .count();
    }

    let uas = num_correct as f64 / num_tokens as f64;
    let complete = num_complete as f64 / num_sentences as f64;
    println!("Sentences = {num_sentences}");
    println!("UAS = {uas}");
    println!("Complete = {complete}");

    Ok(())
}
