//! 検索インデックス生成（オフライン）
//!
//! メタデータストアを読み、インデックスを一時ファイルに書いてから
//! 差し替える。途中で失敗しても既存のインデックスは壊れない。

use crate::error::{ExplorerError, Result};
use emoji_explorer_common::{MetadataStore, RelatedTerms, RuleTable, SearchIndex};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// 生成結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub terms: usize,
    pub bytes: usize,
}

/// メタデータストアを読み込む
pub fn load_store(metadata: &Path) -> Result<MetadataStore> {
    if !metadata.exists() {
        return Err(ExplorerError::FileNotFound(metadata.display().to_string()));
    }
    MetadataStore::from_file(metadata)
        .map_err(|e| ExplorerError::MetadataUnreadable(format!("{}: {}", metadata.display(), e)))
}

/// 標準の関連語ルールでインデックスを生成
pub fn build_index(metadata: &Path, output: &Path) -> Result<IndexReport> {
    build_index_with(metadata, output, &RuleTable::animals())
}

/// 関連語ルールを指定してインデックスを生成
pub fn build_index_with<R: RelatedTerms + ?Sized>(
    metadata: &Path,
    output: &Path,
    related: &R,
) -> Result<IndexReport> {
    let store = load_store(metadata)?;
    tracing::debug!(records = store.len(), "building index from {}", metadata.display());

    let index = SearchIndex::build(&store.emojis, related);
    let json = index
        .to_json()
        .map_err(|e| ExplorerError::IndexBuild(e.to_string()))?;
    write_atomic(output, json.as_bytes())?;

    Ok(IndexReport {
        documents: index.len(),
        terms: index.terms.len(),
        bytes: json.len(),
    })
}

/// 同じディレクトリの一時ファイル経由で書き込む
fn write_atomic(output: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output)
        .map_err(|e| ExplorerError::IndexBuild(format!("{}: {}", output.display(), e.error)))?;
    Ok(())
}
