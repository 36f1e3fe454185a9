//! 辺スコア行列
//!
//! このモジュールは、スコアオラクルが返す N×N の辺スコア行列と、
//! そのテキスト形式の読み書きを提供します。
//!
//! `score(h, d)` はトークン `h` がトークン `d` の主辞である妥当性を表します。
//! 対角成分は参照されません。
//!
//! # テキスト形式
//!
//! ```text
//! # id = sent-1
//! 3
//! _ 0.9 0.1
//! 0.2 _ 0.8
//! 0.3 0.4 _
//! ```
//!
//! 最初の行がトークン数、続くN行が行列の各行です。複数の行列は空行で区切り、
//! `# id = <名前>` のコメントで直後の行列に名前を付けられます。
use std::io::{BufRead, BufReader, Lines, Read, Write};

use crate::errors::{KakariError, Result};

/// 対角成分を表すプレースホルダ
const DIAGONAL_MARKS: [&str; 2] = ["_", "*"];

/// 検証済みの辺スコア行列
///
/// 非対角成分はすべて有限値であることが保証されます。
/// 一度構築された行列は変更されません。
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMatrix {
    num_tokens: usize,
    data: Vec<f32>,
}

impl ScoreMatrix {
    /// 行優先で平坦化されたスコアから行列を作成します。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - トークン数 N
    /// * `data` - 長さ N×N のスコア。`data[h * N + d]` が `score(h, d)` になります。
    ///
    /// # エラー
    ///
    /// 以下の場合、[`KakariError::InvalidInput`]が返されます。
    ///
    /// - `num_tokens` が0の場合
    /// - `data` の長さが N×N でない場合
    /// - 非対角成分に NaN または無限大が含まれる場合
    pub fn new(num_tokens: usize, mut data: Vec<f32>) -> Result<Self> {
        if num_tokens == 0 {
            return Err(KakariError::invalid_input(
                "num_tokens",
                "a sentence must contain at least one token",
            ));
        }
        let expected = num_tokens.checked_mul(num_tokens).ok_or_else(|| {
            KakariError::invalid_input("num_tokens", format!("{num_tokens} tokens is too many"))
        })?;
        if data.len() != expected {
            return Err(KakariError::invalid_input(
                "scores",
                format!(
                    "expected {expected} cells for {num_tokens} tokens, found {}",
                    data.len()
                ),
            ));
        }
        for (i, score) in data.iter_mut().enumerate() {
            let (head, dep) = (i / num_tokens, i % num_tokens);
            if head == dep {
                *score = 0.0;
            } else if !score.is_finite() {
                return Err(KakariError::invalid_input(
                    "scores",
                    format!("edge score [{head}][{dep}] is not finite: {score}"),
                ));
            }
        }
        Ok(Self { num_tokens, data })
    }

    /// 行のスライスから行列を作成します。
    ///
    /// # エラー
    ///
    /// 正方行列でない場合、または[`ScoreMatrix::new`]の検証に失敗した場合にエラーを返します。
    pub fn from_rows<R>(rows: &[R]) -> Result<Self>
    where
        R: AsRef<[f32]>,
    {
        let num_tokens = rows.len();
        let mut data = Vec::with_capacity(num_tokens * num_tokens);
        for (head, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != num_tokens {
                return Err(KakariError::invalid_input(
                    "scores",
                    format!("row {head} has {} cells, expected {num_tokens}", row.len()),
                ));
            }
            data.extend_from_slice(row);
        }
        Self::new(num_tokens, data)
    }

    /// `f(head, dependent)` の値で行列を作成します。
    ///
    /// 対角成分に対しては `f` は呼ばれません。
    pub fn from_fn<F>(num_tokens: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut data = Vec::with_capacity(num_tokens * num_tokens);
        for head in 0..num_tokens {
            for dep in 0..num_tokens {
                data.push(if head == dep { 0.0 } else { f(head, dep) });
            }
        }
        Self::new(num_tokens, data)
    }

    /// テキスト形式の行列を1つ読み込みます。
    ///
    /// # エラー
    ///
    /// 行列がちょうど1つ含まれていない場合、またはフォーマットが不正な場合に
    /// エラーを返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut blocks = MatrixBlocks::new(rdr);
        let (_, matrix) = blocks.next().ok_or_else(|| {
            KakariError::invalid_format("matrix", "input contains no score matrix")
        })??;
        if blocks.next().is_some() {
            return Err(KakariError::invalid_format(
                "matrix",
                "input contains more than one score matrix",
            ));
        }
        Ok(matrix)
    }

    /// トークン数を返します。
    #[inline(always)]
    pub const fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// `head` が `dep` の主辞である辺のスコアを返します。
    #[inline(always)]
    pub fn score(&self, head: usize, dep: usize) -> f32 {
        debug_assert_ne!(head, dep);
        self.data[head * self.num_tokens + dep]
    }

    /// `head` から出る辺のスコア行を返します。
    #[inline(always)]
    pub fn row(&self, head: usize) -> &[f32] {
        &self.data[head * self.num_tokens..(head + 1) * self.num_tokens]
    }

    /// 行優先で平坦化されたスコアを返します。
    #[inline(always)]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// テキスト形式で書き出します。
    ///
    /// 対角成分は `_` で出力されます。
    pub fn write_text<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        writeln!(wtr, "{}", self.num_tokens)?;
        for head in 0..self.num_tokens {
            for (dep, score) in self.row(head).iter().enumerate() {
                if dep != 0 {
                    wtr.write_all(b" ")?;
                }
                if head == dep {
                    wtr.write_all(DIAGONAL_MARKS[0].as_bytes())?;
                } else {
                    write!(wtr, "{score}")?;
                }
            }
            wtr.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// テキスト形式の行列を順に読み込むイテレータ
///
/// 各要素は `# id = ...` で指定された名前（あれば）と行列の組です。
pub struct MatrixBlocks<R> {
    lines: Lines<BufReader<R>>,
    line_no: usize,
}

impl<R> MatrixBlocks<R>
where
    R: Read,
{
    /// 新しいイテレータを作成します。
    pub fn new(rdr: R) -> Self {
        Self {
            lines: BufReader::new(rdr).lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let line = self.lines.next().transpose()?;
        if line.is_some() {
            self.line_no += 1;
        }
        Ok(line)
    }

    fn parse_id(comment: &str) -> Option<&str> {
        let rest = comment.trim().strip_prefix("id")?;
        let value = rest.trim_start().strip_prefix('=')?;
        Some(value.trim())
    }

    fn read_block(&mut self) -> Result<Option<(Option<String>, ScoreMatrix)>> {
        let mut id = None;
        let num_tokens = loop {
            let Some(line) = self.next_line()? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if let Some(name) = Self::parse_id(comment) {
                    id = Some(name.to_string());
                }
                continue;
            }
            break line.parse::<usize>().map_err(|_| {
                KakariError::invalid_format(
                    "matrix",
                    format!("line {}: expected a token count, found {line:?}", self.line_no),
                )
            })?;
        };
        if num_tokens == 0 {
            return Err(KakariError::invalid_input(
                "num_tokens",
                format!("line {}: a sentence must contain at least one token", self.line_no),
            ));
        }

        let mut data = Vec::with_capacity(num_tokens * num_tokens);
        for head in 0..num_tokens {
            let line = self.next_line()?.ok_or_else(|| {
                KakariError::invalid_format(
                    "matrix",
                    format!("unexpected end of input: missing row {head} of {num_tokens}"),
                )
            })?;
            let mut num_cols = 0;
            for field in line.split_ascii_whitespace() {
                let dep = num_cols;
                num_cols += 1;
                if dep >= num_tokens {
                    break;
                }
                let score = if head == dep && DIAGONAL_MARKS.contains(&field) {
                    0.0
                } else {
                    field.parse::<f32>().map_err(|e| {
                        KakariError::invalid_format(
                            "matrix",
                            format!("line {}: invalid score {field:?}: {e}", self.line_no),
                        )
                    })?
                };
                data.push(score);
            }
            if num_cols != num_tokens {
                return Err(KakariError::invalid_format(
                    "matrix",
                    format!(
                        "line {}: expected {num_tokens} columns, found {num_cols}",
                        self.line_no
                    ),
                ));
            }
        }
        ScoreMatrix::new(num_tokens, data).map(|m| Some((id, m)))
    }
}

impl<R> Iterator for MatrixBlocks<R>
where
    R: Read,
{
    type Item = Result<(Option<String>, ScoreMatrix)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_block().transpose()
    }
}
