//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// メタデータストアの内容が不正
    #[error("Invalid metadata store: {0}")]
    InvalidStore(String),

    /// 検索インデックスが未ロード
    #[error("Search index is not loaded")]
    IndexUnavailable,

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Search timed out after {0} ms")]
    SearchTimeout(u64),
}

impl Error {
    /// 検索バックエンド不在（フォールバック対象）かどうか
    pub fn is_index_unavailable(&self) -> bool {
        matches!(self, Error::IndexUnavailable)
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
