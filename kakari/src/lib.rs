//! # Kakari
//!
//! Kakariは、CKY型の動的計画法に基づく射影的依存構造解析（係り受け解析）の実装です。
//!
//! ## 概要
//!
//! N個のトークンに対する N×N の辺スコア行列（`score(h, d)` はトークン `h` が
//! トークン `d` の主辞である妥当性）を受け取り、全辺のスコアの平均が最大となる
//! 単一根の射影的依存構造木を求めます。
//!
//! トークン化、品詞付与、特徴量抽出、スコアモデルは対象外であり、
//! [`ScoreOracle`]として外部から与えます。
//!
//! ## 主な機能
//!
//! - **チャート解析**: スパン `(left, right, root)` ごとの解をメモ化した再帰探索
//! - **適応的な枝刈り**: 主辞からのスコア分布に基づく候補の絞り込み
//! - **探索予算**: スパン数と経過時間による打ち切り
//! - **スコアバンク**: オラクルの出力をrkyv形式で保存・再利用
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kakari::{Parser, ScoreMatrix};
//!
//! let scores = ScoreMatrix::from_reader(
//!     "3
//! _ 0.9 0.1
//! 0.2 _ 0.8
//! 0.3 0.4 _
//! ".as_bytes(),
//! )?;
//!
//! let parser = Parser::new();
//! let mut worker = parser.new_worker();
//! worker.parse(&scores)?;
//! assert!(worker.is_complete());
//! assert_eq!(worker.num_arcs(), 2);
//!
//! let a0 = worker.arc(0);
//! assert_eq!((a0.head(), a0.dependent()), (0, 1));
//!
//! let a1 = worker.arc(1);
//! assert_eq!((a1.head(), a1.dependent()), (1, 2));
//! # Ok(())
//! # }
//! ```

/// スコアバンク
pub mod bank;

/// 依存関係と解析結果の型
pub mod dependency;

/// エラー型の定義
pub mod errors;

/// スコアオラクル
pub mod oracle;

/// 解析器の実装
pub mod parser;

/// オラクルと解析器のパイプライン
pub mod pipeline;

/// 辺スコア行列
pub mod score;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use bank::ScoreBank;
pub use dependency::{Dependency, LabelId, ParseTree};
pub use oracle::ScoreOracle;
pub use parser::worker::Worker;
pub use parser::{Parser, PruneRule};
pub use pipeline::DependencyParser;
pub use score::ScoreMatrix;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
