//! スコアバンクのコンパイラ
//!
//! テキスト形式のスコア行列からバイナリ形式のスコアバンクを構築するサブコマンドと、
//! スコアバンクをテキスト形式に戻すサブコマンドを提供します。

mod build;
mod dump;

use clap::Parser;
use thiserror::Error;

use crate::{build::BuildError, dump::DumpError};

/// コマンドライン引数の構造体
#[derive(Parser, Debug)]
#[clap(name = "compile", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// テキスト形式の行列からバイナリのスコアバンクを構築します
    Build(build::Args),

    /// スコアバンクをテキスト形式で出力します
    Dump(dump::Args),
}

/// コンパイラの実行中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum CompileError {
    /// ビルド中のエラー
    #[error(transparent)]
    BuildError(#[from] BuildError),
    /// ダンプ中のエラー
    #[error(transparent)]
    DumpError(#[from] DumpError),
}

/// メイン関数
///
/// # エラー
///
/// 各サブコマンドの実行中にエラーが発生した場合、そのエラーが返されます。
fn main() -> Result<(), CompileError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => Ok(build::run(args)?),
        Command::Dump(args) => Ok(dump::run(args)?),
    }
}
