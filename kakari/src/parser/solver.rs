//! スパンを再帰的に解く動的計画法の本体。
//!
//! スパン `[left, right]` を主辞 `root` で解く際、主辞から伸ばす辺 `(root, j)` と
//! 分割点 `q` の組を列挙し、2つの部分スパンとその辺に分解します。
//! 部分スパンは必ずチャートを引いてから解くため、各スパンは高々一度しか解かれません。
//!
//! スコアは部分木に含まれる全辺のスコアの算術平均です。幅 w のスパンの完全な木は
//! 常に w-1 本の辺を持つので、平均の最大化は総和の最大化と一致します。
use std::time::{Duration, Instant};

use crate::errors::{BudgetExceededError, BudgetLimit, KakariError, Result};
use crate::parser::chart::{Chart, Resolution, SENTINEL_SCORE, SolutionId, SpanKey, SpanSolution};
use crate::parser::prune::PruneRule;
use crate::score::ScoreMatrix;

/// 経過時間を確認する間隔（解いたスパン数）
const CLOCK_CHECK_INTERVAL: usize = 256;

/// 探索の打ち切り条件。
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SearchBudget {
    pub(crate) max_spans: Option<usize>,
    pub(crate) time_limit: Option<Duration>,
}

/// 分解の候補。
struct Candidate {
    sum: f64,
    num_edges: usize,
    head: usize,
    dep: usize,
    score: f32,
    children: (SolutionId, SolutionId),
}

impl Candidate {
    #[inline(always)]
    fn mean(&self) -> f64 {
        self.sum / self.num_edges as f64
    }
}

/// 1回の解析のためのスパンソルバー。
pub(crate) struct SpanSolver<'a> {
    scores: &'a ScoreMatrix,
    chart: &'a mut Chart,
    prune: PruneRule,
    budget: SearchBudget,
    started: Instant,
}

impl<'a> SpanSolver<'a> {
    pub(crate) fn new(
        scores: &'a ScoreMatrix,
        chart: &'a mut Chart,
        prune: PruneRule,
        budget: SearchBudget,
    ) -> Self {
        Self {
            scores,
            chart,
            prune,
            budget,
            started: Instant::now(),
        }
    }

    /// スパンを解き、チャート内の解のハンドルを返します。
    ///
    /// 解決できないスパンもエラーにはならず、未解決の解として格納されます。
    /// エラーになるのは探索予算を超えた場合のみです。
    pub(crate) fn solve(&mut self, key: SpanKey) -> Result<SolutionId> {
        if let Some(id) = self.chart.lookup(key) {
            return Ok(id);
        }
        let solution = match key.right - key.left {
            0 => self.solve_unit(key),
            1 => self.solve_pair(key),
            _ => self.solve_general(key)?,
        };
        self.check_budget()?;
        self.chart.insert(solution)
    }

    fn solve_unit(&self, key: SpanKey) -> SpanSolution {
        if key.root == key.left {
            SpanSolution::leaf(key)
        } else {
            SpanSolution::single_arc(key, key.root, key.left, self.scores.score(key.root, key.left))
        }
    }

    fn solve_pair(&self, key: SpanKey) -> SpanSolution {
        let target = if key.root == key.left {
            key.right
        } else if key.root == key.right {
            key.left
        } else {
            return SpanSolution::unresolved(key);
        };
        SpanSolution::single_arc(key, key.root, target, self.scores.score(key.root, target))
    }

    fn solve_general(&mut self, key: SpanKey) -> Result<SpanSolution> {
        let SpanKey { left, right, root } = key;
        let threshold = self.prune.threshold(self.scores, root, left, right);
        log::trace!("span {key:?}: threshold {threshold}");

        let mut best: Option<Candidate> = None;
        let mut best_mean = SENTINEL_SCORE;
        for j in left..=right {
            if j == root {
                continue;
            }
            let score = self.scores.score(root, j);
            if score < threshold {
                continue;
            }
            // Each sub-span must contain its own head.
            let splits = if j > root { root..j } else { j..root };
            for q in splits {
                let (left_key, right_key) = if j > root {
                    (SpanKey::new(left, q, root), SpanKey::new(q + 1, right, j))
                } else {
                    (SpanKey::new(left, q, j), SpanKey::new(q + 1, right, root))
                };
                let left_id = self.solve(left_key)?;
                let right_id = self.solve(right_key)?;

                let left_sol = self.chart.solution(left_id);
                let right_sol = self.chart.solution(right_id);
                if !left_sol.is_usable() || !right_sol.is_usable() {
                    continue;
                }
                let candidate = Candidate {
                    sum: left_sol.sum + right_sol.sum + f64::from(score),
                    num_edges: left_sol.num_edges + right_sol.num_edges + 1,
                    head: root,
                    dep: j,
                    score,
                    children: (left_id, right_id),
                };
                let mean = candidate.mean();
                // Ties keep the decomposition found first.
                if mean > best_mean {
                    best_mean = mean;
                    best = Some(candidate);
                }
            }
        }

        Ok(match best {
            Some(c) => SpanSolution {
                key,
                resolution: Resolution::Resolved,
                sum: c.sum,
                num_edges: c.num_edges,
                arc: Some((c.head, c.dep, c.score)),
                children: Some(c.children),
            },
            None => SpanSolution::unresolved(key),
        })
    }

    fn check_budget(&self) -> Result<()> {
        let num_spans = self.chart.len() + 1;
        if let Some(max_spans) = self.budget.max_spans {
            if num_spans > max_spans {
                log::warn!("span budget exhausted after {} spans", self.chart.len());
                return Err(KakariError::BudgetExceeded(BudgetExceededError {
                    num_spans: self.chart.len(),
                    limit: BudgetLimit::Spans(max_spans),
                }));
            }
        }
        if let Some(time_limit) = self.budget.time_limit {
            if num_spans % CLOCK_CHECK_INTERVAL == 0 && self.started.elapsed() > time_limit {
                log::warn!("time budget exhausted after {} spans", self.chart.len());
                return Err(KakariError::BudgetExceeded(BudgetExceededError {
                    num_spans: self.chart.len(),
                    limit: BudgetLimit::TimeMillis(time_limit.as_millis()),
                }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_scores() -> ScoreMatrix {
        ScoreMatrix::from_rows(&[[0.0, 0.9, 0.1], [0.2, 0.0, 0.8], [0.3, 0.4, 0.0]]).unwrap()
    }

    fn solve(scores: &ScoreMatrix, chart: &mut Chart, key: SpanKey) -> SolutionId {
        SpanSolver::new(scores, chart, PruneRule::Adaptive, SearchBudget::default())
            .solve(key)
            .unwrap()
    }

    #[test]
    fn test_unit_span() {
        let scores = example_scores();
        let mut chart = Chart::default();

        let id = solve(&scores, &mut chart, SpanKey::new(1, 1, 1));
        assert_eq!(chart.solution(id).resolution(), Resolution::Leaf);
        assert_eq!(chart.solution(id).arc(), None);
        assert_eq!(chart.solution(id).mean_score(), SENTINEL_SCORE);

        let id = solve(&scores, &mut chart, SpanKey::new(2, 2, 0));
        assert_eq!(chart.solution(id).arc(), Some((0, 2)));
        assert!((chart.solution(id).mean_score() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_pair_span() {
        let scores = example_scores();
        let mut chart = Chart::default();

        let id = solve(&scores, &mut chart, SpanKey::new(1, 2, 1));
        assert_eq!(chart.solution(id).arc(), Some((1, 2)));
        let id = solve(&scores, &mut chart, SpanKey::new(1, 2, 2));
        assert_eq!(chart.solution(id).arc(), Some((2, 1)));
        let id = solve(&scores, &mut chart, SpanKey::new(1, 2, 0));
        assert_eq!(chart.solution(id).resolution(), Resolution::Unresolved);
    }

    #[test]
    fn test_general_span() {
        let scores = example_scores();
        let mut chart = Chart::default();

        let id = solve(&scores, &mut chart, SpanKey::new(0, 2, 0));
        let solution = chart.solution(id);
        assert_eq!(solution.arc(), Some((0, 1)));
        assert_eq!(solution.num_edges(), 2);
        assert!((solution.mean_score() - 0.85).abs() < 1e-6);
        assert_eq!(chart.edge_scores(id), vec![0.8, 0.9]);
    }

    #[test]
    fn test_memo_hit_returns_same_solution() {
        let scores = example_scores();
        let mut chart = Chart::default();

        let first = solve(&scores, &mut chart, SpanKey::new(0, 2, 0));
        let len = chart.len();
        let second = solve(&scores, &mut chart, SpanKey::new(0, 2, 0));
        assert_eq!(first, second);
        assert_eq!(chart.len(), len);
    }

    #[test]
    fn test_fully_pruned_span_is_unresolved() {
        let scores = example_scores();
        let mut chart = Chart::default();
        let id = SpanSolver::new(&scores, &mut chart, PruneRule::Fixed(1.0), SearchBudget::default())
            .solve(SpanKey::new(0, 2, 0))
            .unwrap();
        assert_eq!(chart.solution(id).resolution(), Resolution::Unresolved);
    }

    #[test]
    fn test_span_budget() {
        let scores = ScoreMatrix::from_fn(6, |h, d| ((h * 7 + d * 3) % 10) as f32 / 10.0).unwrap();
        let mut chart = Chart::default();
        let budget = SearchBudget {
            max_spans: Some(4),
            time_limit: None,
        };
        let result = SpanSolver::new(&scores, &mut chart, PruneRule::Disabled, budget)
            .solve(SpanKey::new(0, 5, 0));
        match result {
            Err(KakariError::BudgetExceeded(e)) => {
                assert_eq!(e.limit(), BudgetLimit::Spans(4));
                assert_eq!(e.num_spans(), 4);
            }
            _ => panic!("expected the span budget to be exceeded"),
        }
    }
}
