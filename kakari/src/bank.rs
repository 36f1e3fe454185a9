//! スコアバンク
//!
//! オラクルが出力したスコア行列を文IDごとに保存したコレクションです。
//! バイナリ形式はマジックバイト、16バイト境界へのパディング、rkyvアーカイブの順で構成されます。
//!
//! スコアバンクは[`ScoreOracle<str>`](crate::ScoreOracle)を実装しており、
//! 事前に計算したスコアを使って解析を再現できます。
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use hashbrown::HashMap;
use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, access};

use crate::errors::{KakariError, Result};
use crate::oracle::ScoreOracle;
use crate::score::{MatrixBlocks, ScoreMatrix};

/// スコアバンクを識別するマジックバイト。
///
/// "0.1"はファイルフォーマットのバージョンであり、クレートのバージョンとは独立しています。
pub const BANK_MAGIC: &[u8] = b"KakariScoreBank 0.1\n";

const BANK_MAGIC_LEN: usize = BANK_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (BANK_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;

#[derive(Archive, Serialize, Deserialize)]
struct BankEntry {
    id: String,
    num_tokens: u32,
    scores: Vec<f32>,
}

#[derive(Archive, Serialize, Deserialize)]
struct BankData {
    entries: Vec<BankEntry>,
}

/// 文IDをキーとするスコア行列のコレクション
#[derive(Clone, Debug, Default)]
pub struct ScoreBank {
    entries: Vec<(String, ScoreMatrix)>,
    index: HashMap<String, usize>,
}

impl ScoreBank {
    /// 空のスコアバンクを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// スコア行列を追加します。
    ///
    /// # エラー
    ///
    /// 同じIDが既に登録されている場合、[`KakariError::InvalidInput`]が返されます。
    pub fn push<S>(&mut self, id: S, scores: ScoreMatrix) -> Result<()>
    where
        S: Into<String>,
    {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(KakariError::invalid_input(
                "id",
                format!("duplicate sentence id {id:?}"),
            ));
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, scores));
        Ok(())
    }

    /// IDに対応するスコア行列を返します。
    pub fn get(&self, id: &str) -> Option<&ScoreMatrix> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    /// 登録されている文の数を返します。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// スコアバンクが空かどうかを返します。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 登録順にIDとスコア行列を返すイテレータを作成します。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScoreMatrix)> {
        self.entries.iter().map(|(id, m)| (id.as_str(), m))
    }

    /// テキスト形式の行列の列からスコアバンクを作成します。
    ///
    /// `# id = ...` で名前が付いていない行列には、1から始まる出現順の番号が
    /// IDとして割り当てられます。
    ///
    /// # エラー
    ///
    /// フォーマットが不正な場合、またはIDが重複する場合にエラーを返します。
    pub fn from_text_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut bank = Self::new();
        for (i, block) in MatrixBlocks::new(rdr).enumerate() {
            let (id, scores) = block?;
            let id = id.unwrap_or_else(|| (i + 1).to_string());
            bank.push(id, scores)?;
        }
        Ok(bank)
    }

    /// テキスト形式で書き出します。
    pub fn write_text<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        for (i, (id, scores)) in self.entries.iter().enumerate() {
            if i != 0 {
                wtr.write_all(b"\n")?;
            }
            writeln!(wtr, "# id = {id}")?;
            scores.write_text(&mut wtr)?;
        }
        Ok(())
    }

    /// バイナリ形式にシリアライズして書き出します。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合、またはrkyvのシリアライズに失敗した場合にエラーを返します。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (id, scores) in &self.entries {
            entries.push(BankEntry {
                id: id.clone(),
                num_tokens: u32::try_from(scores.num_tokens()).map_err(|_| {
                    KakariError::invalid_input("scores", format!("{id:?} has too many tokens"))
                })?,
                scores: scores.as_slice().to_vec(),
            });
        }
        let bytes = rkyv::to_bytes::<Error>(&BankData { entries }).map_err(|e| {
            KakariError::invalid_state("rkyv serialization failed".to_string(), e.to_string())
        })?;

        wtr.write_all(BANK_MAGIC)?;
        wtr.write_all(&[0xFF; PADDING_LEN])?;
        wtr.write_all(&bytes)?;
        Ok(())
    }

    /// リーダーからバイナリ形式のスコアバンクを読み込みます。
    ///
    /// # エラー
    ///
    /// この関数は以下の場合にエラーを返します:
    /// - マジックバイトが一致しない場合。
    /// - アーカイブの検証に失敗した場合。
    /// - 格納されたスコア行列が不正な場合。
    pub fn read<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut magic = [0; BANK_MAGIC_LEN];
        rdr.read_exact(&mut magic)?;
        if magic != BANK_MAGIC {
            return Err(KakariError::invalid_format(
                "bank",
                "The magic number of the input score bank mismatches.",
            ));
        }

        let mut padding_buf = [0; PADDING_LEN];
        rdr.read_exact(&mut padding_buf)?;

        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;

        let mut aligned_bytes = AlignedVec::<RKYV_ALIGNMENT>::with_capacity(buffer.len());
        aligned_bytes.extend_from_slice(&buffer);

        let archived = access::<ArchivedBankData, Error>(&aligned_bytes).map_err(|e| {
            KakariError::invalid_state(
                "rkyv validation failed. The score bank may be corrupted or incompatible."
                    .to_string(),
                e.to_string(),
            )
        })?;
        let data = rkyv::deserialize::<BankData, Error>(archived)?;

        let mut bank = Self::new();
        for entry in data.entries {
            let scores = ScoreMatrix::new(entry.num_tokens as usize, entry.scores)?;
            bank.push(entry.id, scores)?;
        }
        Ok(bank)
    }

    /// ファイルパスからバイナリ形式のスコアバンクを読み込みます。
    ///
    /// # エラー
    ///
    /// ファイルを開けない場合、または[`ScoreBank::read`]が失敗した場合にエラーを返します。
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::read(std::io::BufReader::new(file))
    }
}

impl ScoreOracle<str> for ScoreBank {
    fn predict(&self, id: &str) -> Result<ScoreMatrix> {
        self.get(id).cloned().ok_or_else(|| {
            KakariError::oracle_unavailable(format!("no scores for sentence {id:?}"))
        })
    }
}
