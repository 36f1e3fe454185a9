//! スコアバンクのダンプモジュール

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use kakari::errors::KakariError;
use kakari::ScoreBank;

use clap::Parser;

/// ダンプコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "dump", about = "A program to print a score bank as text.")]
pub struct Args {
    /// Binary score bank.
    #[clap(short = 'i', long)]
    bank_in: PathBuf,

    /// Prints only the sentence with this id.
    #[clap(long)]
    id: Option<String>,
}

/// ダンプ処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// 指定されたIDが存在しない
    #[error("Sentence {0:?} is not in the score bank.")]
    UnknownId(String),

    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// スコアバンクの読み込みエラー
    #[error(transparent)]
    Kakari(#[from] KakariError),
}

/// ダンプコマンドを実行します。
pub fn run(args: Args) -> Result<(), DumpError> {
    let bank = ScoreBank::from_path(&args.bank_in)?;
    log::info!("loaded {} sentences", bank.len());

    let out = io::stdout();
    let mut out = BufWriter::new(out.lock());
    match args.id {
        Some(id) => {
            let scores = bank.get(&id).ok_or_else(|| DumpError::UnknownId(id.clone()))?;
            writeln!(out, "# id = {id}")?;
            scores.write_text(&mut out)?;
        }
        None => bank.write_text(&mut out)?,
    }
    out.flush()?;

    Ok(())
}
