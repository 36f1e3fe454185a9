//! 枝刈りの閾値。
//!
//! スパンの主辞から伸ばす辺の候補を、スコアが閾値未満のものについて
//! 探索から除外します。閾値は計算量と精度のトレードオフであり、
//! 得られる木の射影性には影響しません。
use crate::score::ScoreMatrix;

/// このトークン数以下のスパンでは枝刈りを行いません。
const MAX_UNPRUNED_WIDTH: usize = 4;

/// 適応的な閾値の上限。
const ADAPTIVE_CAP: f32 = 0.2;

/// 適応的な閾値を求める際に平均スコアに掛ける係数。
const ADAPTIVE_RATIO: f32 = 0.7;

/// 枝刈りの規則。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PruneRule {
    /// 主辞からの平均スコアに基づく適応的な閾値。
    ///
    /// 幅4以下のスパンでは `0`、それ以外では
    /// `min(0.2, 0.7 * mean(score(root, i)))` を閾値とします。
    #[default]
    Adaptive,

    /// すべてのスパンで固定の閾値を使用します。
    Fixed(f32),

    /// 枝刈りを行いません。
    Disabled,
}

impl PruneRule {
    /// スパン `[left, right]` を主辞 `root` で解く際の閾値を返します。
    ///
    /// `score(root, j)` がこの値未満の候補 `j` は探索されません。
    pub fn threshold(&self, scores: &ScoreMatrix, root: usize, left: usize, right: usize) -> f32 {
        match *self {
            Self::Adaptive => {
                if right - left < MAX_UNPRUNED_WIDTH {
                    return 0.0;
                }
                let row = &scores.row(root)[left..=right];
                let mut sum = 0.0;
                let mut count = 0;
                for (i, &score) in (left..).zip(row) {
                    if i != root {
                        sum += score;
                        count += 1;
                    }
                }
                ADAPTIVE_CAP.min(sum / count as f32 * ADAPTIVE_RATIO)
            }
            Self::Fixed(threshold) => threshold,
            Self::Disabled => f32::NEG_INFINITY,
        }
    }
}
