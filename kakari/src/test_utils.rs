//! テスト用ユーティリティ
//!
//! 決定的な乱数によるスコア行列の生成と、小さな文に対する全探索を提供します。

use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::parser::chart::SpanKey;
use crate::score::ScoreMatrix;

/// [0, 1) のスコアを持つランダムな行列を生成します。
pub(crate) fn random_scores(num_tokens: usize, seed: u64) -> ScoreMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    ScoreMatrix::from_fn(num_tokens, |_, _| rng.gen::<f32>()).unwrap()
}

/// 枝刈りなしの探索で `(0, N-1, root)` から到達するスパンを列挙します。
///
/// チャートを使わず、分割規則だけから求めます。
pub(crate) fn reachable_spans(num_tokens: usize, root: usize) -> HashSet<SpanKey> {
    let mut seen = HashSet::new();
    let mut stack = vec![SpanKey::new(0, num_tokens - 1, root)];
    while let Some(key) = stack.pop() {
        if !seen.insert(key) || key.right - key.left < 2 {
            continue;
        }
        let SpanKey { left, right, root } = key;
        for j in (left..=right).filter(|&j| j != root) {
            if j > root {
                for q in root..j {
                    stack.push(SpanKey::new(left, q, root));
                    stack.push(SpanKey::new(q + 1, right, j));
                }
            } else {
                for q in j..root {
                    stack.push(SpanKey::new(left, q, j));
                    stack.push(SpanKey::new(q + 1, right, root));
                }
            }
        }
    }
    seen
}

/// `heads` が `root` を根とする木であれば、各トークンの祖先関係を返します。
fn ancestors(heads: &[Option<usize>], root: usize) -> Option<Vec<Vec<bool>>> {
    let n = heads.len();
    let mut is_ancestor = vec![vec![false; n]; n];
    for start in 0..n {
        let mut cur = start;
        let mut steps = 0;
        while cur != root {
            cur = heads[cur]?;
            is_ancestor[cur][start] = true;
            steps += 1;
            if steps > n {
                return None;
            }
        }
    }
    Some(is_ancestor)
}

/// `heads` が `root` を根とする射影的な木かどうかを判定します。
pub(crate) fn is_projective_tree(heads: &[Option<usize>], root: usize) -> bool {
    if heads[root].is_some() {
        return false;
    }
    let Some(is_ancestor) = ancestors(heads, root) else {
        return false;
    };
    for (dep, head) in heads.iter().enumerate() {
        let Some(head) = *head else { continue };
        let (lo, hi) = if head < dep { (head, dep) } else { (dep, head) };
        for k in lo + 1..hi {
            if !is_ancestor[head][k] {
                return false;
            }
        }
    }
    true
}

/// すべての射影的な木を列挙し、辺スコアの平均の最大値を返します。
pub(crate) fn brute_force_best_mean(scores: &ScoreMatrix, root: usize) -> Option<f64> {
    let n = scores.num_tokens();
    if n == 1 {
        return None;
    }
    let deps: Vec<usize> = (0..n).filter(|&i| i != root).collect();
    let mut choice = vec![0; deps.len()];
    let mut best: Option<f64> = None;
    loop {
        let mut heads = vec![None; n];
        for (&dep, &c) in deps.iter().zip(&choice) {
            // Skips the dependent itself so that every choice is a distinct token.
            heads[dep] = Some(if c >= dep { c + 1 } else { c });
        }
        if is_projective_tree(&heads, root) {
            let sum: f64 = deps
                .iter()
                .map(|&d| f64::from(scores.score(heads[d].unwrap(), d)))
                .sum();
            let mean = sum / deps.len() as f64;
            if best.map_or(true, |b| mean > b) {
                best = Some(mean);
            }
        }

        let mut i = 0;
        loop {
            if i == choice.len() {
                return best;
            }
            choice[i] += 1;
            if choice[i] < n - 1 {
                break;
            }
            choice[i] = 0;
            i += 1;
        }
    }
}
