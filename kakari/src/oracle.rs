//! スコアオラクル
//!
//! 文から辺スコア行列を予測する外部モデルとの境界を定義します。
//! モデルの実体（特徴量抽出や勾配ブースティングなど）はこのクレートの対象外です。
use crate::errors::Result;
use crate::score::ScoreMatrix;

/// 文に対して N×N の辺スコア行列を返すオラクル
///
/// 予測に失敗した場合は[`KakariError::OracleUnavailable`](crate::errors::KakariError::OracleUnavailable)
/// を返してください。解析器はオラクルを一度だけ呼び出し、再試行は行いません。
///
/// 複数のスレッドで共有する場合、`predict` は再入可能でなければなりません。
/// そうでない実装は呼び出し側で直列化してください。
///
/// クロージャ `Fn(&S) -> Result<ScoreMatrix>` もオラクルとして使用できます。
///
/// # 例
///
/// ```
/// use kakari::{ScoreMatrix, ScoreOracle};
///
/// let oracle = |tokens: &[&str]| {
///     ScoreMatrix::from_fn(tokens.len(), |h, d| if h + 1 == d { 0.9 } else { 0.1 })
/// };
/// let scores = oracle.predict(&["百度", "推出", "服务"][..])?;
/// assert_eq!(scores.num_tokens(), 3);
/// # Ok::<(), kakari::errors::KakariError>(())
/// ```
pub trait ScoreOracle<S: ?Sized> {
    /// 文の辺スコア行列を予測します。
    fn predict(&self, sentence: &S) -> Result<ScoreMatrix>;
}

impl<S, F> ScoreOracle<S> for F
where
    S: ?Sized,
    F: Fn(&S) -> Result<ScoreMatrix>,
{
    #[inline(always)]
    fn predict(&self, sentence: &S) -> Result<ScoreMatrix> {
        self(sentence)
    }
}
