//! 選択のファイル永続化
//!
//! 形式: `{ "selectedEmojis": [ ... ] }`
//! 要素はID文字列（旧形式のレコードも読める）。

use emoji_explorer_common::selection::parse_persisted;
use emoji_explorer_common::{SelectionStore, SELECTION_STORAGE_KEY};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// JSONファイルに選択を保存するストア
#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_ids(&self) -> Option<Vec<String>> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let value: Value = serde_json::from_str(&content).ok()?;
        let entries = value.get(SELECTION_STORAGE_KEY)?;
        parse_persisted(&entries.to_string())
    }
}

impl SelectionStore for FileSelectionStore {
    fn load(&self) -> Vec<String> {
        if !self.path.exists() {
            return Vec::new();
        }
        match self.read_ids() {
            Some(ids) => ids,
            None => {
                tracing::warn!("選択ファイルが壊れているため無視します: {}", self.path.display());
                Vec::new()
            }
        }
    }

    fn save(&self, ids: &[String]) -> emoji_explorer_common::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut doc = Map::new();
        doc.insert(SELECTION_STORAGE_KEY.to_string(), serde_json::to_value(ids)?);
        let content = serde_json::to_string_pretty(&Value::Object(doc))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
