use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 設定ファイルの場所を上書きする環境変数
pub const CONFIG_ENV: &str = "EMOJI_EXPLORER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 絵文字画像フォルダ
    pub emojis_dir: PathBuf,
    /// 配信URLの接頭辞（レコードの path に使う）
    pub url_prefix: String,
    /// HTTP配信元（ZIP取得用、未設定ならローカル）
    pub base_url: Option<String>,
    pub metadata_path: PathBuf,
    pub index_path: PathBuf,
    /// 選択の保存先（未設定ならデータディレクトリ）
    pub selection_path: Option<PathBuf>,
    pub search_timeout_ms: u64,
    pub status_clear_ms: u64,
    pub error_status_clear_ms: u64,
    pub grid_columns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            emojis_dir: PathBuf::from("public/emojis"),
            url_prefix: "/emojis".into(),
            base_url: None,
            metadata_path: PathBuf::from("src/data/emoji-metadata.json"),
            index_path: PathBuf::from("public/search-index.json"),
            selection_path: None,
            search_timeout_ms: 5000,
            status_clear_ms: 2000,
            error_status_clear_ms: 3000,
            grid_columns: 9,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        // 環境変数を優先
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| ExplorerError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("emoji-explorer").join("config.json"))
    }

    /// 選択の保存先
    pub fn selection_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.selection_path {
            return Ok(path.clone());
        }
        let data = dirs::data_dir()
            .ok_or_else(|| ExplorerError::Config("データディレクトリが見つかりません".into()))?;
        Ok(data.join("emoji-explorer").join("selection.json"))
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn status_clear(&self) -> Duration {
        Duration::from_millis(self.status_clear_ms)
    }

    pub fn error_status_clear(&self) -> Duration {
        Duration::from_millis(self.error_status_clear_ms)
    }

    pub fn set_emojis_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.emojis_dir = dir;
        self.save()
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        self.base_url = Some(url);
        self.save()
    }
}
