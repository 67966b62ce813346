//! 検索インデックス構築モジュール
//!
//! メタデータストアから転置インデックスを作る。
//! 出力は `BTreeMap` 順で直列化されるため、同じストアからは同じバイト列になる。

use crate::error::{Error, Result};
use crate::related::RelatedTerms;
use crate::types::AssetRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// インデックス形式のバージョン
pub const INDEX_VERSION: u32 = 1;

/// 検索対象フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Url,
    Content,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Url, Field::Content];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::Content => "content",
        }
    }
}

/// 結果表示用に保持するメタデータ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub id: String,
    pub size: u64,
    pub filename: String,
    pub created: String,
}

/// インデックス対象ドキュメント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexEntry {
    pub url: String,
    pub content: String,
    pub meta: EntryMeta,
}

impl SearchIndexEntry {
    /// レコード1件からエントリを作る
    pub fn from_record<R: RelatedTerms + ?Sized>(record: &AssetRecord, related: &R) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for term in record
            .categories
            .iter()
            .chain(record.tags.iter())
            .cloned()
            .chain(related.related_terms(&record.path))
        {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }

        Self {
            url: record.path.clone(),
            content: terms.join(", "),
            meta: EntryMeta {
                id: record.id.clone(),
                size: record.size,
                filename: record.filename.clone(),
                created: record.created.clone(),
            },
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Url => &self.url,
            Field::Content => &self.content,
        }
    }
}

/// 転置リストの1要素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: u32,
    pub field: Field,
    pub tf: u32,
}

/// 直列化される検索インデックス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub version: u32,
    pub keys: Vec<String>,
    pub documents: Vec<SearchIndexEntry>,
    pub terms: BTreeMap<String, Vec<Posting>>,
}

impl SearchIndex {
    /// レコード列からインデックスを構築
    pub fn build<R: RelatedTerms + ?Sized>(records: &[AssetRecord], related: &R) -> Self {
        let documents: Vec<SearchIndexEntry> = records
            .iter()
            .map(|r| SearchIndexEntry::from_record(r, related))
            .collect();

        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        for (doc, entry) in documents.iter().enumerate() {
            for field in Field::ALL {
                let mut counts: BTreeMap<String, u32> = BTreeMap::new();
                for token in tokenize(entry.field(field)) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                for (token, tf) in counts {
                    terms.entry(token).or_default().push(Posting {
                        doc: doc as u32,
                        field,
                        tf,
                    });
                }
            }
        }

        Self {
            version: INDEX_VERSION,
            keys: Field::ALL.iter().map(|f| f.as_str().to_string()).collect(),
            documents,
            terms,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON文字列から読み込み（バージョンと参照整合性を検証）
    pub fn from_json(json: &str) -> Result<Self> {
        let index: Self = serde_json::from_str(json)?;
        if index.version != INDEX_VERSION {
            return Err(Error::Config(format!(
                "unsupported index version {} (expected {})",
                index.version, INDEX_VERSION
            )));
        }
        let doc_count = index.documents.len() as u32;
        if let Some((term, _)) = index
            .terms
            .iter()
            .find(|(_, postings)| postings.iter().any(|p| p.doc >= doc_count))
        {
            return Err(Error::Config(format!("posting out of range for term {:?}", term)));
        }
        Ok(index)
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// 小文字化して英数字以外で分割
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
