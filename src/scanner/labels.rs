//! ラベル（カテゴリ・タグ）サイドカー
//!
//! 画像フォルダ直下の `labels.json` からファイル名ごとのラベルを読む。
//! ラベルの推定自体はこのツールの範囲外。

use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const LABELS_FILE_NAME: &str = "labels.json";

/// 1ファイル分のラベル
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// ファイル名 → ラベル
#[derive(Debug, Clone, Default)]
pub struct LabelFile {
    entries: HashMap<String, Labels>,
}

impl LabelFile {
    /// フォルダの labels.json を読む（無ければ空）
    pub fn load(folder: &Path) -> Result<Self> {
        let path = folder.join(LABELS_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let entries: HashMap<String, Labels> = serde_json::from_str(&content).map_err(|e| {
            ExplorerError::MetadataUnreadable(format!("{}: {}", path.display(), e))
        })?;
        Ok(Self { entries })
    }

    /// ラベル未登録なら空
    pub fn get(&self, file_name: &str) -> Labels {
        self.entries.get(file_name).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
