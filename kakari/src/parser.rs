//! CKY型の動的計画法に基づく射影的依存構造解析器。
//!
//! このモジュールは、辺スコア行列から最良の単一根の射影的依存構造木を求める
//! 解析器を提供します。
//!
//! # 主要な構造体
//!
//! - [`Parser`]: 根の位置、枝刈り規則、探索予算などの設定を保持する解析器
//! - [`Worker`]: 解析器のワーカー。チャートを所有し、実際の解析処理を行う
//!
//! # 例
//!
//! ```
//! use kakari::{Parser, ScoreMatrix};
//!
//! let scores = ScoreMatrix::from_rows(&[
//!     [0.0, 0.9, 0.1],
//!     [0.2, 0.0, 0.8],
//!     [0.3, 0.4, 0.0],
//! ])?;
//! let parser = Parser::new();
//! let mut worker = parser.new_worker();
//! worker.parse(&scores)?;
//!
//! for arc in worker.arc_iter() {
//!     println!("{} -> {}", arc.head(), arc.dependent());
//! }
//! # Ok::<(), kakari::errors::KakariError>(())
//! ```
pub mod chart;
mod extract;
mod prune;
mod solver;
pub mod worker;

use std::time::Duration;

use crate::dependency::ParseTree;
use crate::errors::Result;
use crate::parser::solver::SearchBudget;
use crate::parser::worker::Worker;
use crate::score::ScoreMatrix;

pub use crate::parser::prune::PruneRule;

/// 射影的依存構造解析器。
///
/// `Parser`は設定のみを保持する軽量な値です。複製して複数のスレッドで共有でき、
/// 各スレッドは[`Parser::new_worker`]で独立したワーカーを作成して解析を行います。
///
/// # 例
///
/// ```
/// use std::time::Duration;
/// use kakari::{Parser, PruneRule};
///
/// let parser = Parser::new()
///     .root(0)
///     .prune_rule(PruneRule::Adaptive)
///     .max_spans(1_000_000)
///     .time_limit(Duration::from_millis(500));
/// let worker = parser.new_worker();
/// # let _ = worker;
/// ```
#[derive(Clone, Debug, Default)]
pub struct Parser {
    root: usize,
    prune: PruneRule,
    budget: SearchBudget,
}

impl Parser {
    /// 新しい解析器を作成します。
    ///
    /// 根は位置0、枝刈りは[`PruneRule::Adaptive`]、探索予算は無制限です。
    pub const fn new() -> Self {
        Self {
            root: 0,
            prune: PruneRule::Adaptive,
            budget: SearchBudget {
                max_spans: None,
                time_limit: None,
            },
        }
    }

    /// 木の根とするトークン位置を指定します。
    ///
    /// デフォルトは0です。
    pub const fn root(mut self, root: usize) -> Self {
        self.root = root;
        self
    }

    /// 枝刈り規則を指定します。
    pub const fn prune_rule(mut self, prune: PruneRule) -> Self {
        self.prune = prune;
        self
    }

    /// 1回の解析で解くスパン数の上限を指定します。
    ///
    /// # 引数
    ///
    /// * `max_spans` - スパン数の上限。0は無制限を示します。
    pub const fn max_spans(mut self, max_spans: usize) -> Self {
        if max_spans != 0 {
            self.budget.max_spans = Some(max_spans);
        } else {
            self.budget.max_spans = None;
        }
        self
    }

    /// 1回の解析にかける時間の上限を指定します。
    ///
    /// 経過時間は一定数のスパンを解くごとに確認されるため、
    /// 上限をわずかに超えてから打ち切られることがあります。
    pub const fn time_limit(mut self, time_limit: Duration) -> Self {
        self.budget.time_limit = Some(time_limit);
        self
    }

    /// 根のトークン位置を返します。
    pub const fn root_index(&self) -> usize {
        self.root
    }

    /// 新しいワーカーを作成します。
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }

    /// 一時的なワーカーで1文を解析し、結果を返します。
    ///
    /// 多数の文を解析する場合は、ワーカーを再利用する方が効率的です。
    ///
    /// # エラー
    ///
    /// [`Worker::parse`]と同じ条件でエラーを返します。
    pub fn parse(&self, scores: &ScoreMatrix) -> Result<ParseTree> {
        let mut worker = self.new_worker();
        worker.parse(scores)?;
        Ok(worker.to_tree())
    }
}
