//! スコアオラクルと解析器をつなぐパイプライン
//!
//! オラクルの呼び出しは解析1回につき一度だけで、再帰探索の前に完了します。
//! オラクルの失敗は探索を始める前に呼び出し側へ返されます。
use std::sync::Arc;

use crate::dependency::ParseTree;
use crate::errors::Result;
use crate::oracle::ScoreOracle;
use crate::parser::Parser;
use crate::parser::worker::Worker;

/// オラクルと解析器の組
///
/// # 例
///
/// ```
/// use kakari::{DependencyParser, Parser, ScoreMatrix};
///
/// let oracle = |tokens: &[&str]| {
///     ScoreMatrix::from_fn(tokens.len(), |h, d| if h + 1 == d { 0.9 } else { 0.1 })
/// };
/// let parser = DependencyParser::new(oracle, Parser::new());
/// let mut worker = parser.new_worker();
///
/// parser.parse(&mut worker, &["百度", "推出", "服务"][..])?;
/// assert_eq!(worker.num_arcs(), 2);
/// # Ok::<(), kakari::errors::KakariError>(())
/// ```
pub struct DependencyParser<O> {
    oracle: Arc<O>,
    parser: Parser,
}

impl<O> Clone for DependencyParser<O> {
    fn clone(&self) -> Self {
        Self {
            oracle: Arc::clone(&self.oracle),
            parser: self.parser.clone(),
        }
    }
}

impl<O> DependencyParser<O> {
    /// 新しいパイプラインを作成します。
    pub fn new(oracle: O, parser: Parser) -> Self {
        Self {
            oracle: Arc::new(oracle),
            parser,
        }
    }

    /// 共有されたオラクルから新しいパイプラインを作成します。
    ///
    /// 複数のスレッドで同じオラクルを読み取り専用で共有する場合に使用します。
    pub fn from_shared_oracle(oracle: Arc<O>, parser: Parser) -> Self {
        Self { oracle, parser }
    }

    /// オラクルへの参照を返します。
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// 解析器の設定を返します。
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// 新しいワーカーを作成します。
    pub fn new_worker(&self) -> Worker {
        self.parser.new_worker()
    }

    /// 文のスコアをオラクルから取得し、ワーカーで解析します。
    ///
    /// # エラー
    ///
    /// オラクルが返したエラー（[`KakariError::OracleUnavailable`](crate::errors::KakariError::OracleUnavailable)など）
    /// および[`Worker::parse`]のエラーを返します。
    pub fn parse<S>(&self, worker: &mut Worker, sentence: &S) -> Result<()>
    where
        S: ?Sized,
        O: ScoreOracle<S>,
    {
        let scores = self.oracle.predict(sentence)?;
        worker.parse(&scores)
    }

    /// 一時的なワーカーで1文を解析し、結果を返します。
    pub fn parse_to_tree<S>(&self, sentence: &S) -> Result<ParseTree>
    where
        S: ?Sized,
        O: ScoreOracle<S>,
    {
        let scores = self.oracle.predict(sentence)?;
        self.parser.parse(&scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::KakariError;
    use crate::score::ScoreMatrix;

    #[test]
    fn test_oracle_failure_is_surfaced() {
        let oracle = |_: &str| -> Result<ScoreMatrix> {
            Err(KakariError::oracle_unavailable("model is not loaded"))
        };
        let parser = DependencyParser::new(oracle, Parser::new());
        let mut worker = parser.new_worker();
        let result = parser.parse(&mut worker, "百度推出服务");
        assert!(matches!(result, Err(KakariError::OracleUnavailable(_))));
        assert_eq!(worker.num_arcs(), 0);
    }

    #[test]
    fn test_parse_to_tree() {
        let oracle = |n: &usize| ScoreMatrix::from_fn(*n, |h, d| if d == h + 1 { 0.8 } else { 0.3 });
        let parser = DependencyParser::new(oracle, Parser::new());
        let tree = parser.parse_to_tree(&4usize).unwrap();
        assert!(tree.is_complete());
        let heads = tree.heads();
        assert_eq!(heads, vec![None, Some(0), Some(1), Some(2)]);
    }
}
