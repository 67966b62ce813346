//! Export core modules shared across CLI and other front ends.

pub mod encoders;
pub mod status;

pub use encoders::{encode_css, encode_html, encode_markdown, encode_plain_text};
pub use status::{StatusKind, StatusMessage};

use crate::types::AssetRecord;

/// エクスポート形式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    PlainText,
    Html,
    Css,
    Markdown,
    Zip,
}

impl ExportFormat {
    /// 文字列として出力できる形式か
    pub fn is_textual(&self) -> bool {
        !matches!(self, ExportFormat::Zip)
    }

    /// ステータス表示用の名前
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::PlainText => "ファイル名",
            ExportFormat::Html => "HTML",
            ExportFormat::Css => "CSS",
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Zip => "ZIP",
        }
    }

    /// 選択順のレコード列を文字列化（ZIPは None）
    pub fn encode(&self, records: &[AssetRecord]) -> Option<String> {
        match self {
            ExportFormat::PlainText => Some(encode_plain_text(records)),
            ExportFormat::Html => Some(encode_html(records)),
            ExportFormat::Css => Some(encode_css(records)),
            ExportFormat::Markdown => Some(encode_markdown(records)),
            ExportFormat::Zip => None,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(ExportFormat::PlainText),
            "html" => Ok(ExportFormat::Html),
            "css" => Ok(ExportFormat::Css),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "zip" => Ok(ExportFormat::Zip),
            _ => Err(format!(
                "Unknown format: {}. Use text, html, css, markdown, or zip",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::PlainText => write!(f, "text"),
            ExportFormat::Html => write!(f, "html"),
            ExportFormat::Css => write!(f, "css"),
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Zip => write!(f, "zip"),
        }
    }
}
