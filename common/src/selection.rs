//! 選択状態と永続化の契約
//!
//! 選択順（クリック順）はエクスポート順になるため、挿入順を保持する。

use crate::error::Result;
use crate::types::AssetRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;

/// 永続化キー
pub const SELECTION_STORAGE_KEY: &str = "selectedEmojis";

/// 挿入順を保つID集合
///
/// 順序は `ids`、所属判定は `set` が持つ。両者は常に同じ要素を持つ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    ids: Vec<String>,
    set: HashSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存ID列から復元（重複は先勝ち）
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::new();
        for id in ids {
            state.insert(id.into());
        }
        state
    }

    pub fn contains(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    /// 末尾に追加（既に選択済みなら false）
    pub fn insert(&mut self, id: String) -> bool {
        if !self.set.insert(id.clone()) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// 選択を反転し、反転後に選択されているかを返す
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.set.remove(id) {
            self.ids.retain(|s| s != id);
            false
        } else {
            self.insert(id.to_string())
        }
    }

    /// 和集合（既存順を保ち、新規分を与えられた順に追加）。追加数を返す
    pub fn extend_ids<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for id in ids {
            if self.insert(id.to_string()) {
                added += 1;
            }
        }
        added
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.set.clear();
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn id_set(&self) -> HashSet<&str> {
        self.set.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 永続化された選択の1要素（ID文字列または旧形式のレコード）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistedEntry {
    Id(String),
    Record(AssetRecord),
}

impl PersistedEntry {
    pub fn id(&self) -> &str {
        match self {
            PersistedEntry::Id(id) => id,
            PersistedEntry::Record(record) => &record.id,
        }
    }
}

/// 永続化データを解析（壊れていれば空）
pub fn parse_persisted(json: &str) -> Option<Vec<String>> {
    let entries: Vec<PersistedEntry> = serde_json::from_str(json).ok()?;
    Some(entries.iter().map(|e| e.id().to_string()).collect())
}

/// 選択の永続化先
pub trait SelectionStore: Send {
    /// 読み込み。欠損・破損時は空を返す
    fn load(&self) -> Vec<String>;

    fn save(&self, ids: &[String]) -> Result<()>;
}

/// メモリ上の選択ストア（テスト・一時セッション用）
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    ids: Mutex<Vec<String>>,
    fail_saves: bool,
}

impl MemorySelectionStore {
    pub fn new(ids: Vec<String>) -> Self {
        Self {
            ids: Mutex::new(ids),
            fail_saves: false,
        }
    }

    /// 保存が常に失敗するストア
    pub fn failing() -> Self {
        Self {
            ids: Mutex::new(Vec::new()),
            fail_saves: true,
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.ids.lock().map(|ids| ids.clone()).unwrap_or_default()
    }
}

impl SelectionStore for MemorySelectionStore {
    fn load(&self) -> Vec<String> {
        self.snapshot()
    }

    fn save(&self, ids: &[String]) -> Result<()> {
        if self.fail_saves {
            return Err(std::io::Error::other("storage unavailable").into());
        }
        if let Ok(mut guard) = self.ids.lock() {
            *guard = ids.to_vec();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_appends_in_click_order() {
        let mut selection = SelectionState::new();
        assert!(selection.toggle("b"));
        assert!(selection.toggle("a"));
        assert!(selection.toggle("c"));
        assert_eq!(selection.ids(), &["b", "a", "c"]);
    }

    #[test]
    fn test_toggle_twice_restores_order() {
        let mut selection = SelectionState::from_ids(["a", "b", "c"]);
        let before = selection.clone();
        assert!(!selection.toggle("b"));
        assert_eq!(selection.ids(), &["a", "c"]);
        assert!(selection.toggle("b"));
        // 再追加は末尾
        assert_eq!(selection.ids(), &["a", "c", "b"]);

        let mut selection = before.clone();
        selection.toggle("x");
        selection.toggle("x");
        assert_eq!(selection, before);
    }

    #[test]
    fn test_extend_ids_union() {
        let mut selection = SelectionState::from_ids(["b"]);
        let added = selection.extend_ids(["a", "b", "c"]);
        assert_eq!(added, 2);
        assert_eq!(selection.ids(), &["b", "a", "c"]);
    }

    #[test]
    fn test_from_ids_dedupes() {
        let selection = SelectionState::from_ids(["a", "a", "b"]);
        assert_eq!(selection.ids(), &["a", "b"]);
    }

    #[test]
    fn test_membership_follows_order_list() {
        let mut selection = SelectionState::from_ids((0..5000).map(|i| i.to_string()));
        assert_eq!(selection.len(), 5000);
        assert!(selection.contains("4999"));
        assert!(!selection.contains("5000"));

        assert!(!selection.toggle("2500"));
        assert!(!selection.contains("2500"));
        assert_eq!(selection.len(), 4999);
        assert_eq!(selection.id_set().len(), selection.ids().len());

        assert!(selection.toggle("2500"));
        assert_eq!(selection.ids().last().map(String::as_str), Some("2500"));

        selection.clear();
        assert!(selection.is_empty());
        assert!(!selection.contains("0"), "クリア後も残っている");
        assert!(selection.insert("0".to_string()));
    }

    #[test]
    fn test_parse_persisted_ids_and_records() {
        let ids = parse_persisted(r#"["1", {"id": "2", "filename": "b.png", "path": "/e/b.png"}]"#)
            .expect("解析失敗");
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_parse_persisted_corrupt() {
        assert!(parse_persisted("not json").is_none());
        assert!(parse_persisted(r#"{"a": 1}"#).is_none());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySelectionStore::default();
        store.save(&["x".to_string()]).unwrap();
        assert_eq!(store.load(), vec!["x"]);
        assert!(MemorySelectionStore::failing().save(&[]).is_err());
    }
}
