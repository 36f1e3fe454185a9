//! スパンの解を保持するチャート（メモ表）の実装モジュール。
//!
//! 各スパン `(left, right, root)` の解はアリーナに一度だけ格納され、
//! 親スパンからは[`SolutionId`]で参照されます。同じ子の解を複数の親が
//! 共有するため、解同士の参照は木ではなく有向非巡回グラフを成します。
use hashbrown::HashMap;

use crate::errors::{KakariError, Result};

/// 到達し得ないスコアを表す番兵値。
pub const SENTINEL_SCORE: f64 = f64::NEG_INFINITY;

/// スパンの識別子。
///
/// `[left, right]` の区間を `root` を主辞として覆う射影的な部分木を表します。
/// 3つの値をそのまま保持するため、トークン数によらず衝突しません。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanKey {
    /// 区間の左端（両端を含む）。
    pub left: usize,
    /// 区間の右端（両端を含む）。
    pub right: usize,
    /// 部分木の主辞。
    pub root: usize,
}

impl SpanKey {
    /// 新しいスパン識別子を作成します。
    #[inline(always)]
    pub const fn new(left: usize, right: usize, root: usize) -> Self {
        debug_assert!(left <= right);
        Self { left, right, root }
    }

    /// 区間に含まれるトークン数を返します。
    #[inline(always)]
    pub const fn width(&self) -> usize {
        self.right - self.left + 1
    }
}

/// チャート内の解へのハンドル。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SolutionId(u32);

impl SolutionId {
    #[inline(always)]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// スパンの解決状態。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// 主辞のみからなる1トークンの部分木。辺を持ちません。
    Leaf,
    /// 1本以上の辺を持つ部分木。
    Resolved,
    /// どの分解も成立しなかったスパン。親の候補になり得ません。
    Unresolved,
}

/// 1つのスパンに対する最良の解。
#[derive(Clone, Debug)]
pub struct SpanSolution {
    pub(crate) key: SpanKey,
    pub(crate) resolution: Resolution,
    /// 部分木の辺スコアの総和。
    pub(crate) sum: f64,
    /// 部分木の辺の本数。
    pub(crate) num_edges: usize,
    /// このスパンで選ばれた辺 `(head, dependent)` とそのスコア。
    pub(crate) arc: Option<(usize, usize, f32)>,
    pub(crate) children: Option<(SolutionId, SolutionId)>,
}

impl SpanSolution {
    /// 1トークンの葉を作成します。
    pub(crate) const fn leaf(key: SpanKey) -> Self {
        Self {
            key,
            resolution: Resolution::Leaf,
            sum: 0.0,
            num_edges: 0,
            arc: None,
            children: None,
        }
    }

    /// 解決できなかったスパンを作成します。
    pub(crate) const fn unresolved(key: SpanKey) -> Self {
        Self {
            key,
            resolution: Resolution::Unresolved,
            sum: 0.0,
            num_edges: 0,
            arc: None,
            children: None,
        }
    }

    /// 1本の辺だけからなる解を作成します。
    pub(crate) fn single_arc(key: SpanKey, head: usize, dep: usize, score: f32) -> Self {
        Self {
            key,
            resolution: Resolution::Resolved,
            sum: f64::from(score),
            num_edges: 1,
            arc: Some((head, dep, score)),
            children: None,
        }
    }

    /// スパンの識別子を返します。
    #[inline(always)]
    pub const fn key(&self) -> SpanKey {
        self.key
    }

    /// 解決状態を返します。
    #[inline(always)]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// 親スパンの分解に使用できるかどうかを返します。
    #[inline(always)]
    pub fn is_usable(&self) -> bool {
        self.resolution != Resolution::Unresolved
    }

    /// 部分木の辺スコアの平均を返します。
    ///
    /// 辺を持たない解（葉や未解決のスパン）では[`SENTINEL_SCORE`]を返します。
    #[inline(always)]
    pub fn mean_score(&self) -> f64 {
        if self.num_edges == 0 {
            SENTINEL_SCORE
        } else {
            self.sum / self.num_edges as f64
        }
    }

    /// 部分木の辺の本数を返します。
    #[inline(always)]
    pub const fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// このスパンで選ばれた辺 `(head, dependent)` を返します。
    #[inline(always)]
    pub fn arc(&self) -> Option<(usize, usize)> {
        self.arc.map(|(head, dep, _)| (head, dep))
    }

    /// 最適な分解における左右の子の解を返します。
    #[inline(always)]
    pub const fn children(&self) -> Option<(SolutionId, SolutionId)> {
        self.children
    }
}

/// 挿入専用のスパン解のメモ表。
///
/// ワーカーが1回の解析ごとにクリアして使用します。
/// 挿入済みの解は変更されません。
#[derive(Default)]
pub struct Chart {
    index: HashMap<SpanKey, SolutionId>,
    arena: Vec<SpanSolution>,
    num_inserts: usize,
}

impl Chart {
    /// 新しい解析のためにチャートを空にします。
    ///
    /// 確保済みのメモリは再利用されます。
    pub fn clear(&mut self) {
        self.index.clear();
        self.arena.clear();
        self.num_inserts = 0;
    }

    /// スパンの解を検索します。
    #[inline(always)]
    pub fn lookup(&self, key: SpanKey) -> Option<SolutionId> {
        self.index.get(&key).copied()
    }

    /// スパンの解を挿入します。
    ///
    /// # エラー
    ///
    /// 同じスパンの解が既に挿入されている場合、[`KakariError::InvalidState`]が返されます。
    /// 既存の解は変更されません。
    pub fn insert(&mut self, solution: SpanSolution) -> Result<SolutionId> {
        let key = solution.key;
        if self.index.contains_key(&key) {
            return Err(KakariError::invalid_state(
                "span is already solved",
                format!("{key:?}"),
            ));
        }
        let id = SolutionId(u32::try_from(self.arena.len()).map_err(|_| {
            KakariError::invalid_state("chart is full", format!("{key:?}"))
        })?);
        self.arena.push(solution);
        self.index.insert(key, id);
        self.num_inserts += 1;
        Ok(id)
    }

    /// ハンドルが指す解を返します。
    #[inline(always)]
    pub fn solution(&self, id: SolutionId) -> &SpanSolution {
        &self.arena[id.index()]
    }

    /// 格納されている解の数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// チャートが空かどうかを返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// 最後のクリア以降に成功した挿入の回数を返します。
    #[inline(always)]
    pub fn num_inserts(&self) -> usize {
        self.num_inserts
    }

    /// 部分木の辺スコアを、左の子、右の子、このスパンの辺の順で並べて返します。
    pub fn edge_scores(&self, id: SolutionId) -> Vec<f32> {
        let mut scores = Vec::with_capacity(self.solution(id).num_edges);
        self.append_edge_scores(id, &mut scores);
        scores
    }

    fn append_edge_scores(&self, id: SolutionId, scores: &mut Vec<f32>) {
        let solution = self.solution(id);
        if let Some((left, right)) = solution.children {
            self.append_edge_scores(left, scores);
            self.append_edge_scores(right, scores);
        }
        if let Some((_, _, score)) = solution.arc {
            scores.push(score);
        }
    }
}
