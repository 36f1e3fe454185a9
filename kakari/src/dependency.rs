//! 依存関係の結果コンテナ
//!
//! このモジュールは、解析結果として得られる主辞と従属語の組と、
//! 1文分の依存構造木を表現する型を提供します。
use std::fmt;

use crate::errors::{KakariError, ParseFailureError, Result};

/// 依存関係ラベルの識別子
///
/// ラベル分類器の出力を格納するための枠です。
/// 解析器自身はラベルを付与しません。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u16);

/// 主辞から従属語への有向辺
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dependency {
    head: usize,
    dependent: usize,
    score: f32,
    label: Option<LabelId>,
}

impl Dependency {
    #[inline(always)]
    pub(crate) const fn new(head: usize, dependent: usize, score: f32) -> Self {
        Self {
            head,
            dependent,
            score,
            label: None,
        }
    }

    /// 主辞のトークン位置を取得します。
    #[inline(always)]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// 従属語のトークン位置を取得します。
    #[inline(always)]
    pub const fn dependent(&self) -> usize {
        self.dependent
    }

    /// オラクルが与えた辺のスコアを取得します。
    #[inline(always)]
    pub const fn score(&self) -> f32 {
        self.score
    }

    /// 依存関係ラベルを取得します。
    #[inline(always)]
    pub const fn label(&self) -> Option<LabelId> {
        self.label
    }

    /// ラベルを付与した依存関係を返します。
    #[inline(always)]
    pub const fn with_label(mut self, label: LabelId) -> Self {
        self.label = Some(label);
        self
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.head, self.dependent)
    }
}

/// 1文分の解析結果
///
/// [`Worker`](crate::parser::worker::Worker)から独立した所有型です。
/// 辺の並びは木の前順走査（スパンの辺、左の子、右の子）の順です。
#[derive(Clone, Debug, PartialEq)]
pub struct ParseTree {
    pub(crate) num_tokens: usize,
    pub(crate) root: usize,
    pub(crate) arcs: Vec<Dependency>,
    pub(crate) mean_score: Option<f64>,
    pub(crate) num_spans: usize,
}

impl ParseTree {
    /// トークン数を返します。
    pub const fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// 根のトークン位置を返します。
    pub const fn root(&self) -> usize {
        self.root
    }

    /// 依存関係の列を返します。
    pub fn arcs(&self) -> &[Dependency] {
        &self.arcs
    }

    /// 依存関係の列を取り出します。
    pub fn into_arcs(self) -> Vec<Dependency> {
        self.arcs
    }

    /// 木の全辺のスコアの平均を返します。
    ///
    /// 辺が1本もない場合は`None`を返します。
    pub const fn mean_score(&self) -> Option<f64> {
        self.mean_score
    }

    /// 解析中に解いたスパンの数を返します。
    pub const fn num_spans(&self) -> usize {
        self.num_spans
    }

    /// 全トークンを覆う木が得られたかどうかを返します。
    ///
    /// スコアだけでは辺の少ない最適解と失敗を区別できないため、
    /// 辺の本数が N-1 であることで判定します。
    pub fn is_complete(&self) -> bool {
        self.arcs.len() + 1 == self.num_tokens
    }

    /// 完全な木であることを確認します。
    ///
    /// # エラー
    ///
    /// 辺の本数が N-1 に満たない場合、[`KakariError::ParseFailure`]が返されます。
    pub fn ensure_complete(&self) -> Result<&Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(KakariError::ParseFailure(ParseFailureError {
                num_tokens: self.num_tokens,
                num_arcs: self.arcs.len(),
            }))
        }
    }

    /// 各トークンの主辞を返します。
    ///
    /// 根および主辞が割り当てられなかったトークンは`None`になります。
    pub fn heads(&self) -> Vec<Option<usize>> {
        let mut heads = vec![None; self.num_tokens];
        for arc in &self.arcs {
            heads[arc.dependent] = Some(arc.head);
        }
        heads
    }
}
