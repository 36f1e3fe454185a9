//! エラー型の定義
//!
//! このモジュールは、Kakariライブラリで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt::{self, Debug};

/// Kakari専用のResult型
///
/// エラー型としてデフォルトで[`KakariError`]を使用します。
pub type Result<T, E = KakariError> = std::result::Result<T, E>;

/// Kakariのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
#[derive(Debug, thiserror::Error)]
pub enum KakariError {
    /// 無効な入力エラー
    ///
    /// [`InvalidInputError`]のエラーバリアント。
    /// 探索を始める前に検出されます。
    #[error(transparent)]
    InvalidInput(InvalidInputError),

    /// 無効なフォーマットエラー
    ///
    /// [`InvalidFormatError`]のエラーバリアント。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 無効な状態エラー
    ///
    /// [`InvalidStateError`]のエラーバリアント。
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// スコアオラクルが利用できないエラー
    ///
    /// オラクルがスコア行列を返せなかった場合に発生します。
    #[error("Score oracle is unavailable: {0}")]
    OracleUnavailable(String),

    /// 探索予算の超過
    ///
    /// [`BudgetExceededError`]のエラーバリアント。
    #[error(transparent)]
    BudgetExceeded(BudgetExceededError),

    /// 解析失敗
    ///
    /// [`ParseFailureError`]のエラーバリアント。
    #[error(transparent)]
    ParseFailure(ParseFailureError),

    /// I/Oエラー
    ///
    /// [`std::io::Error`](std::io::Error)のエラーバリアント。
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// rkyvシリアライゼーションエラー
    ///
    /// [`rkyv::rancor::Error`](rkyv::rancor::Error)のエラーバリアント。
    #[error(transparent)]
    RkyvError(#[from] rkyv::rancor::Error),
}

impl KakariError {
    /// 無効な入力エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 入力の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_input<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidInput(InvalidInputError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効な状態エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    /// オラクル利用不可エラーを生成します
    ///
    /// 外部のスコアモデルを[`ScoreOracle`](crate::ScoreOracle)として
    /// 実装する際に使用します。
    pub fn oracle_unavailable<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::OracleUnavailable(msg.into())
    }
}

/// 入力が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidInputError {
    /// 入力の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidInputError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidInputError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}

/// 探索予算を使い切った場合に使用されるエラー
#[derive(Debug)]
pub struct BudgetExceededError {
    /// 打ち切りまでに解いたスパン数
    pub(crate) num_spans: usize,

    /// 超過した予算の種類
    pub(crate) limit: BudgetLimit,
}

/// 超過した予算の種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetLimit {
    /// スパン数の上限
    Spans(usize),
    /// 経過時間の上限（ミリ秒）
    TimeMillis(u128),
}

impl BudgetExceededError {
    /// 打ち切りまでに解いたスパン数を返します。
    pub fn num_spans(&self) -> usize {
        self.num_spans
    }

    /// 超過した予算を返します。
    pub fn limit(&self) -> BudgetLimit {
        self.limit
    }
}

impl fmt::Display for BudgetExceededError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.limit {
            BudgetLimit::Spans(max) => write!(
                f,
                "BudgetExceededError: solved {} spans, limit is {max}",
                self.num_spans
            ),
            BudgetLimit::TimeMillis(ms) => write!(
                f,
                "BudgetExceededError: {ms} ms elapsed after {} spans",
                self.num_spans
            ),
        }
    }
}

impl Error for BudgetExceededError {}

/// 完全な木が得られなかった場合に使用されるエラー
#[derive(Debug)]
pub struct ParseFailureError {
    /// トークン数
    pub(crate) num_tokens: usize,

    /// 抽出された依存関係の数
    pub(crate) num_arcs: usize,
}

impl fmt::Display for ParseFailureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ParseFailureError: {} arcs extracted for {} tokens, expected {}",
            self.num_arcs,
            self.num_tokens,
            self.num_tokens.saturating_sub(1)
        )
    }
}

impl Error for ParseFailureError {}
