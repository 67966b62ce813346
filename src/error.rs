use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoAssetsFound(String),

    #[error("メタデータを読み込めません: {0}")]
    MetadataUnreadable(String),

    #[error("インデックス生成エラー: {0}")]
    IndexBuild(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] emoji_explorer_common::Error),

    #[error("アセット取得エラー ({path}): {reason}")]
    FetchFailed { path: String, reason: String },

    #[error("エクスポートエラー: {0}")]
    ExportFailed(String),

    #[error("クリップボードへの書き込みに失敗: {0}")]
    ClipboardWriteFailed(String),

    #[error("絵文字が選択されていません")]
    EmptySelection,

    #[error("不明な絵文字ID: {0}")]
    UnknownAsset(String),

    #[error("入力エラー: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
