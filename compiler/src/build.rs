//! スコアバンクのビルドモジュール
//!
//! `# id = ...` 付きのテキスト行列の列を読み込み、バイナリのスコアバンクとして書き出します。

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use kakari::errors::KakariError;
use kakari::ScoreBank;

use clap::Parser;

/// ビルドコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "build", about = "A program to build a binary score bank.")]
pub struct Args {
    /// Text matrices. If omitted, they are read from stdin.
    #[clap(short = 'i', long)]
    matrices_in: Option<PathBuf>,

    /// File to which the binary score bank is output.
    #[clap(short = 'o', long)]
    bank_out: PathBuf,
}

/// ビルド処理中に発生する可能性のあるエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// 入力が空
    #[error("No score matrix was found in the input.")]
    EmptyInput,

    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 行列の読み込みまたは書き出しのエラー
    #[error(transparent)]
    Kakari(#[from] KakariError),
}

/// ビルドコマンドを実行します。
///
/// # エラー
///
/// 入力が不正な場合、または出力に失敗した場合にエラーを返します。
pub fn run(args: Args) -> Result<(), BuildError> {
    eprintln!("Reading the score matrices...");
    let bank = match args.matrices_in {
        Some(path) => ScoreBank::from_text_reader(BufReader::new(File::open(path)?))?,
        None => ScoreBank::from_text_reader(io::stdin().lock())?,
    };
    if bank.is_empty() {
        return Err(BuildError::EmptyInput);
    }
    log::info!("read {} sentences", bank.len());

    eprintln!("Writing the score bank...");
    let mut wtr = BufWriter::new(File::create(&args.bank_out)?);
    bank.write(&mut wtr)?;
    wtr.flush()?;
    eprintln!("Wrote {} sentences to {}", bank.len(), args.bank_out.display());

    Ok(())
}
