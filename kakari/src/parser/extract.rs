//! 解いた木から依存関係の列を取り出します。
use crate::dependency::Dependency;
use crate::parser::chart::{Chart, SolutionId};

/// `root` の解を前順に走査し、依存関係を `arcs` に追加します。
///
/// 各スパンでは自身の辺、左の子、右の子の順に出力します。
pub(crate) fn append_arcs(chart: &Chart, root: SolutionId, arcs: &mut Vec<Dependency>) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let solution = chart.solution(id);
        if let Some((head, dep, score)) = solution.arc {
            arcs.push(Dependency::new(head, dep, score));
        }
        if let Some((left, right)) = solution.children {
            // Pushed in reverse so that the left child is visited first.
            stack.push(right);
            stack.push(left);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::parser::chart::{SpanKey, SpanSolution};

    #[test]
    fn test_pre_order() {
        let mut chart = Chart::default();
        let leaf = chart.insert(SpanSolution::leaf(SpanKey::new(0, 0, 0))).unwrap();
        let pair = chart.insert(SpanSolution::single_arc(SpanKey::new(1, 2, 1), 1, 2, 0.8)).unwrap();
        let mut top = SpanSolution::single_arc(SpanKey::new(0, 2, 0), 0, 1, 0.9);
        top.children = Some((leaf, pair));
        let top = chart.insert(top).unwrap();

        let mut arcs = vec![];
        append_arcs(&chart, top, &mut arcs);
        let pairs: Vec<_> = arcs.iter().map(|a| (a.head(), a.dependent())).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
        assert_eq!(arcs[0].score(), 0.9);
    }

    #[test]
    fn test_leaf_has_no_arcs() {
        let mut chart = Chart::default();
        let leaf = chart.insert(SpanSolution::leaf(SpanKey::new(0, 0, 0))).unwrap();
        let mut arcs = vec![];
        append_arcs(&chart, leaf, &mut arcs);
        assert!(arcs.is_empty());
    }
}
