//! 依存構造解析のためのルーチンを提供するモジュール。
//!
//! ワーカーはチャートと結果のバッファを保持し、それらを再利用することで
//! 不要なメモリアロケーションを避けます。チャートは解析のたびにクリアされるため、
//! 前の文の解が次の文から参照されることはありません。
use std::time::Instant;

use crate::dependency::{Dependency, ParseTree};
use crate::errors::{KakariError, Result};
use crate::parser::Parser;
use crate::parser::chart::{Chart, SolutionId, SpanKey};
use crate::parser::extract::append_arcs;
use crate::parser::solver::SpanSolver;
use crate::score::ScoreMatrix;

/// 依存構造解析のためのルーチンを提供する構造体。
///
/// 1つのワーカーは同時に1つの文しか解析しません。複数の文を並列に解析する場合は、
/// スレッドごとに[`Parser::new_worker`]でワーカーを作成してください。
///
/// # 例
///
/// ```
/// use kakari::{Parser, ScoreMatrix};
///
/// let scores = ScoreMatrix::from_rows(&[
///     [0.0, 0.9, 0.1],
///     [0.2, 0.0, 0.8],
///     [0.3, 0.4, 0.0],
/// ])?;
/// let mut worker = Parser::new().new_worker();
/// worker.parse(&scores)?;
///
/// let arcs: Vec<_> = worker.arc_iter().map(|a| (a.head(), a.dependent())).collect();
/// assert_eq!(arcs, vec![(0, 1), (1, 2)]);
/// assert!((worker.mean_score().unwrap() - 0.85).abs() < 1e-6);
/// # Ok::<(), kakari::errors::KakariError>(())
/// ```
pub struct Worker {
    pub(crate) parser: Parser,
    pub(crate) chart: Chart,
    pub(crate) arcs: Vec<Dependency>,
    pub(crate) top: Option<SolutionId>,
    pub(crate) num_tokens: usize,
}

impl Worker {
    /// 新しいインスタンスを作成します。
    pub(crate) fn new(parser: Parser) -> Self {
        Self {
            parser,
            chart: Chart::default(),
            arcs: vec![],
            top: None,
            num_tokens: 0,
        }
    }

    /// スコア行列から最良の射影的依存構造木を求めます。
    ///
    /// 結果は内部状態に保存され、`arc_iter()`や`mean_score()`でアクセスできます。
    /// 完全な木が得られたかどうかは[`Worker::is_complete`]で確認してください。
    ///
    /// # エラー
    ///
    /// - 根の位置がトークン数の範囲外の場合、[`KakariError::InvalidInput`]が返されます。
    /// - 探索予算を超えた場合、[`KakariError::BudgetExceeded`]が返されます。
    ///
    /// いずれの場合も、以前の解析結果は破棄されています。
    pub fn parse(&mut self, scores: &ScoreMatrix) -> Result<()> {
        self.chart.clear();
        self.arcs.clear();
        self.top = None;
        self.num_tokens = 0;

        let num_tokens = scores.num_tokens();
        let root = self.parser.root;
        if root >= num_tokens {
            return Err(KakariError::invalid_input(
                "root",
                format!("root {root} is out of range for {num_tokens} tokens"),
            ));
        }

        let started = Instant::now();
        let mut solver = SpanSolver::new(scores, &mut self.chart, self.parser.prune, self.parser.budget);
        let top = solver.solve(SpanKey::new(0, num_tokens - 1, root))?;

        if self.chart.solution(top).is_usable() {
            append_arcs(&self.chart, top, &mut self.arcs);
        }
        self.top = Some(top);
        self.num_tokens = num_tokens;

        log::debug!(
            "parsed {} tokens: {} arcs, {} spans, {:?}",
            num_tokens,
            self.arcs.len(),
            self.chart.len(),
            started.elapsed()
        );
        Ok(())
    }

    /// 最後に解析した文のトークン数を返します。
    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// 依存関係の数を返します。
    #[inline(always)]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// `i`番目の依存関係を返します。
    ///
    /// # パニック
    ///
    /// `i`が[`Worker::num_arcs`]以上の場合、パニックします。
    #[inline(always)]
    pub fn arc(&self, i: usize) -> &Dependency {
        &self.arcs[i]
    }

    /// 依存関係のイテレータを作成します。
    #[inline(always)]
    pub fn arc_iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.arcs.iter()
    }

    /// 木の全辺のスコアの平均を返します。
    ///
    /// 辺が1本もない場合は`None`を返します。
    pub fn mean_score(&self) -> Option<f64> {
        self.top
            .map(|id| self.chart.solution(id))
            .filter(|solution| solution.is_usable() && solution.num_edges() != 0)
            .map(|solution| solution.mean_score())
    }

    /// 全トークンを覆う木が得られたかどうかを返します。
    pub fn is_complete(&self) -> bool {
        self.top.is_some() && self.arcs.len() + 1 == self.num_tokens
    }

    /// 最後の解析で解いたスパンの数を返します。
    ///
    /// 各スパンは高々一度しか解かれないため、これはチャートへの挿入回数と一致します。
    #[inline(always)]
    pub fn num_spans(&self) -> usize {
        self.chart.num_inserts()
    }

    /// 木の辺スコアを返します。
    ///
    /// 並びは左の部分木、右の部分木、分割に使われた辺の順です。
    pub fn edge_scores(&self) -> Vec<f32> {
        match self.top {
            Some(id) if self.chart.solution(id).is_usable() => self.chart.edge_scores(id),
            _ => vec![],
        }
    }

    /// 解析結果を所有型の[`ParseTree`]として取り出します。
    pub fn to_tree(&self) -> ParseTree {
        ParseTree {
            num_tokens: self.num_tokens,
            root: self.parser.root,
            arcs: self.arcs.clone(),
            mean_score: self.mean_score(),
            num_spans: self.num_spans(),
        }
    }
}
