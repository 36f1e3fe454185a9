//! Kakariのテストモジュール群
//!
//! 解析器全体の性質（木の形、決定性、メモ化、枝刈り、最適性）と
//! スコアバンクを通したパイプラインを検証するテストを含みます。

mod parser;
