//! 絵文字メタデータの型定義
//!
//! CLIと検索/選択ステートで共有される型:
//! - AssetRecord: 1画像分のメタデータ（不変）
//! - MetadataStore: オフライン生成されたレコード列（まるごと差し替え）

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// 絵文字1件分のメタデータ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// ファイル名から導出した安定ID
    pub id: String,

    pub filename: String,

    /// 配信用の相対URL（例: /emojis/cat.png）
    pub path: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// ISO-8601 作成日時
    #[serde(default)]
    pub created: String,

    #[serde(default)]
    pub size: u64,
}

impl AssetRecord {
    /// カテゴリ条件に一致するか（"all" は常に一致）
    pub fn matches_category(&self, category: &str) -> bool {
        category == crate::ALL_CATEGORIES || self.categories.iter().any(|c| c == category)
    }
}

/// メタデータファイル全体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStore {
    #[serde(default)]
    pub total: usize,

    #[serde(default)]
    pub last_updated: String,

    pub emojis: Vec<AssetRecord>,
}

impl MetadataStore {
    pub fn new(emojis: Vec<AssetRecord>, last_updated: String) -> Self {
        Self {
            total: emojis.len(),
            last_updated,
            emojis,
        }
    }

    /// JSON文字列から読み込み（検証込み）
    pub fn from_json(json: &str) -> Result<Self> {
        let store: Self = serde_json::from_str(json)?;
        store.validate()?;
        Ok(store)
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// IDの一意性とパスの形式を検証
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for record in &self.emojis {
            if record.id.trim().is_empty() {
                return Err(Error::InvalidStore(format!(
                    "record without id: {}",
                    record.filename
                )));
            }
            if !seen.insert(record.id.as_str()) {
                return Err(Error::InvalidStore(format!("duplicate id: {}", record.id)));
            }
            if record.path.is_empty() || record.path.contains("://") {
                return Err(Error::InvalidStore(format!(
                    "path is not a relative URL: {:?}",
                    record.path
                )));
            }
        }
        Ok(())
    }

    /// カテゴリ一覧（重複除去・ソート済み）
    pub fn categories(&self) -> Vec<String> {
        self.emojis
            .iter()
            .flat_map(|r| r.categories.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }
}
