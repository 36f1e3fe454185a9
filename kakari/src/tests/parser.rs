use std::collections::HashSet;
use std::time::Duration;

use proptest::prelude::*;

use crate::errors::{BudgetLimit, KakariError};
use crate::parser::{Parser, PruneRule};
use crate::score::ScoreMatrix;
use crate::test_utils::{brute_force_best_mean, is_projective_tree, random_scores, reachable_spans};

fn arc_pairs(worker: &crate::Worker) -> Vec<(usize, usize)> {
    worker.arc_iter().map(|a| (a.head(), a.dependent())).collect()
}

/// 3トークンの具体例
#[test]
fn test_three_tokens() {
    let scores =
        ScoreMatrix::from_rows(&[[0.0, 0.9, 0.1], [0.2, 0.0, 0.8], [0.3, 0.4, 0.0]]).unwrap();
    let tree = Parser::new().parse(&scores).unwrap();

    let pairs: Vec<_> = tree.arcs().iter().map(|a| (a.head(), a.dependent())).collect();
    assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    assert!((tree.mean_score().unwrap() - 0.85).abs() < 1e-6);
    assert!(tree.is_complete());
}

#[test]
fn test_single_and_two_tokens() {
    let tree = Parser::new().parse(&random_scores(1, 7)).unwrap();
    assert!(tree.arcs().is_empty());
    assert!(tree.ensure_complete().is_ok());

    for root in 0..2 {
        let tree = Parser::new().root(root).parse(&random_scores(2, 7)).unwrap();
        assert_eq!(tree.arcs().len(), 1);
        assert_eq!(tree.arcs()[0].head(), root);
        assert_eq!(tree.arcs()[0].dependent(), 1 - root);
    }
}

proptest! {
    /// 完全な木は N-1 本の辺を持ち、根以外の各トークンがちょうど一度だけ従属語になる
    #[test]
    fn test_tree_shape(num_tokens in 1usize..=12, root_ratio in 0.0f64..1.0, seed in any::<u64>()) {
        let root = ((num_tokens as f64 * root_ratio) as usize).min(num_tokens - 1);
        let scores = random_scores(num_tokens, seed);
        let tree = Parser::new().root(root).parse(&scores).unwrap();
        prop_assert!(tree.is_complete());
        prop_assert_eq!(tree.arcs().len(), num_tokens - 1);

        let deps: HashSet<_> = tree.arcs().iter().map(|a| a.dependent()).collect();
        let expected: HashSet<_> = (0..num_tokens).filter(|&i| i != root).collect();
        prop_assert_eq!(deps, expected);

        prop_assert!(is_projective_tree(&tree.heads(), root));
    }
}

#[test]
fn test_deterministic() {
    let scores = random_scores(15, 42);
    let parser = Parser::new();
    let first = parser.parse(&scores).unwrap();
    for _ in 0..3 {
        let mut worker = parser.new_worker();
        worker.parse(&scores).unwrap();
        assert_eq!(worker.to_tree(), first);
    }
}

/// 枝刈りなしでは、到達可能なスパンがちょうど一度ずつ解かれる
#[test]
fn test_each_span_solved_once() {
    for num_tokens in [1, 2, 3, 6, 9] {
        for root in [0, num_tokens / 2, num_tokens - 1] {
            let scores = random_scores(num_tokens, 3);
            let mut worker = Parser::new()
                .root(root)
                .prune_rule(PruneRule::Disabled)
                .new_worker();
            worker.parse(&scores).unwrap();

            let expected = reachable_spans(num_tokens, root);
            assert_eq!(worker.num_spans(), expected.len(), "n={num_tokens} root={root}");
            for key in expected {
                assert!(worker.chart.lookup(key).is_some(), "{key:?} was not solved");
            }
        }
    }
}

/// 枝刈りを厳しくしても平均スコアは上がらない
#[test]
fn test_pruning_never_improves_score() {
    for num_tokens in 5..=9 {
        for seed in 0..8 {
            let scores = random_scores(num_tokens, seed);
            let baseline = Parser::new()
                .prune_rule(PruneRule::Fixed(0.0))
                .parse(&scores)
                .unwrap();
            let unpruned = Parser::new()
                .prune_rule(PruneRule::Disabled)
                .parse(&scores)
                .unwrap();
            let baseline_mean = baseline.mean_score().unwrap();
            assert!((baseline_mean - unpruned.mean_score().unwrap()).abs() < 1e-9);

            for rule in [PruneRule::Adaptive, PruneRule::Fixed(0.1), PruneRule::Fixed(0.3)] {
                let tree = Parser::new().prune_rule(rule).parse(&scores).unwrap();
                if let Some(mean) = tree.mean_score().filter(|_| tree.is_complete()) {
                    assert!(mean <= baseline_mean + 1e-9, "{rule:?}: {mean} > {baseline_mean}");
                }
            }
        }
    }
}

/// 枝刈りなしの解は全射影木の中で最良
#[test]
fn test_matches_brute_force() {
    for num_tokens in 2..=6 {
        for seed in 0..6 {
            let scores = random_scores(num_tokens, 1000 + seed);
            for root in 0..num_tokens {
                let tree = Parser::new()
                    .root(root)
                    .prune_rule(PruneRule::Disabled)
                    .parse(&scores)
                    .unwrap();
                let expected = brute_force_best_mean(&scores, root).unwrap();
                let actual = tree.mean_score().unwrap();
                assert!(
                    (expected - actual).abs() < 1e-9,
                    "n={num_tokens} seed={seed} root={root}: {actual} != {expected}"
                );
            }
        }
    }
}

#[test]
fn test_ties_keep_first_decomposition() {
    let scores = ScoreMatrix::from_fn(3, |_, _| 0.5).unwrap();
    let mut worker = Parser::new().new_worker();
    worker.parse(&scores).unwrap();
    // j = 1 with q = 0 is the first decomposition explored.
    assert_eq!(arc_pairs(&worker), vec![(0, 1), (1, 2)]);
}

#[test]
fn test_non_finite_scores_are_rejected() {
    let result = ScoreMatrix::from_fn(4, |h, d| if (h, d) == (1, 3) { f32::NAN } else { 0.5 });
    assert!(matches!(result, Err(KakariError::InvalidInput(_))));
    let result = ScoreMatrix::from_fn(4, |h, d| if (h, d) == (3, 0) { f32::INFINITY } else { 0.5 });
    assert!(matches!(result, Err(KakariError::InvalidInput(_))));
}

#[test]
fn test_span_budget_exceeded() {
    let scores = random_scores(10, 5);
    let mut worker = Parser::new().max_spans(20).new_worker();
    let result = worker.parse(&scores);
    assert!(matches!(result, Err(KakariError::BudgetExceeded(_))));
    assert_eq!(worker.num_arcs(), 0);

    // Zero means unlimited.
    let mut worker = Parser::new().max_spans(0).new_worker();
    worker.parse(&scores).unwrap();
    assert!(worker.is_complete());
}

#[test]
fn test_concurrent_workers() {
    let parser = Parser::new();
    let matrices: Vec<_> = (0..8).map(|i| random_scores(8 + i, i as u64)).collect();
    let expected: Vec<_> = matrices.iter().map(|m| parser.parse(m).unwrap()).collect();

    let actual: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = matrices
            .iter()
            .map(|m| {
                let parser = parser.clone();
                s.spawn(move || {
                    let mut worker = parser.new_worker();
                    worker.parse(m).unwrap();
                    worker.to_tree()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(actual, expected);
}

#[test]
fn test_time_budget_exceeded() {
    // The clock is read once every 256 spans, so short sentences never reach it.
    let mut worker = Parser::new().time_limit(Duration::ZERO).new_worker();
    worker.parse(&random_scores(8, 9)).unwrap();
    assert!(worker.is_complete());
    assert!(worker.num_spans() < 256);

    let mut worker = Parser::new()
        .prune_rule(PruneRule::Disabled)
        .time_limit(Duration::ZERO)
        .new_worker();
    match worker.parse(&random_scores(16, 9)) {
        Err(KakariError::BudgetExceeded(e)) => {
            assert_eq!(e.limit(), BudgetLimit::TimeMillis(0));
            assert_eq!(e.num_spans(), 255);
        }
        other => panic!("expected the time budget to be exceeded, got {other:?}"),
    }
    assert_eq!(worker.num_arcs(), 0);
    assert!(!worker.is_complete());
}
