//! エクスポート出力先とステータス文言
//!
//! 文字列形式のエンコードは common 側。ここでは出力先（標準出力・ファイル・
//! クリップボード）への書き出しと、ZIPアーカイブの組み立てを扱う。

pub mod zip;

pub use self::zip::{build_zip, sanitize_entry_name, AssetSource, ZipReport, ZIP_FILE_NAME};

use crate::error::{ExplorerError, Result};
use emoji_explorer_common::{AssetRecord, ExportFormat, StatusMessage};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// クリップボード書き込み
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// OSのクリップボードコマンドを順に試す
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("clip", &[]),
];

fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("終了コード {}", status)))
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut last_error = "クリップボードコマンドが見つかりません".to_string();
        for (program, args) in CLIPBOARD_COMMANDS {
            match pipe_to(program, args, text) {
                Ok(()) => {
                    tracing::debug!("copied {} bytes via {}", text.len(), program);
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!("{} unavailable: {}", program, e);
                    last_error = format!("{}: {}", program, e);
                }
            }
        }
        Err(ExplorerError::ClipboardWriteFailed(last_error))
    }
}

/// 文字列出力の行き先
#[derive(Clone, Copy)]
pub enum TextSink<'a> {
    Stdout,
    File(&'a Path),
    Clipboard(&'a dyn Clipboard),
}

impl TextSink<'_> {
    pub fn is_clipboard(&self) -> bool {
        matches!(self, TextSink::Clipboard(_))
    }
}

/// 文字列を出力先へ書き出す
pub fn deliver_text(text: &str, sink: TextSink<'_>) -> Result<()> {
    match sink {
        TextSink::Stdout => {
            println!("{}", text);
            Ok(())
        }
        TextSink::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, text)?;
            Ok(())
        }
        TextSink::Clipboard(clipboard) => clipboard.write_text(text),
    }
}

/// 選択順のレコードを文字列形式で出力
pub fn export_text(format: ExportFormat, records: &[AssetRecord], sink: TextSink<'_>) -> Result<()> {
    if records.is_empty() {
        return Err(ExplorerError::EmptySelection);
    }
    let text = format
        .encode(records)
        .ok_or_else(|| ExplorerError::ExportFailed(format!("{}は文字列として出力できません", format.label())))?;
    deliver_text(&text, sink)
}

/// 文字列出力の結果を表示文言にする
pub fn text_status(format: ExportFormat, sink: TextSink<'_>, result: &Result<()>) -> StatusMessage {
    let label = format.label();
    match (result, sink.is_clipboard()) {
        (Err(ExplorerError::EmptySelection), _) => StatusMessage::failure("絵文字が選択されていません"),
        (Ok(()), true) => StatusMessage::success(format!("{}をクリップボードにコピーしました!", label)),
        (Ok(()), false) => StatusMessage::success(format!("{}を出力しました!", label)),
        (Err(_), true) => StatusMessage::failure(format!("{}のコピーに失敗しました!", label)),
        (Err(_), false) => StatusMessage::failure(format!("{}の出力に失敗しました!", label)),
    }
}

/// ZIP作成中の表示
pub fn zip_progress_status() -> StatusMessage {
    StatusMessage::progress("ZIP準備中...")
}

/// ZIP作成結果の表示
pub fn zip_status(result: &Result<ZipReport>) -> StatusMessage {
    match result {
        Ok(report) if report.skipped.is_empty() => {
            StatusMessage::success(format!("ZIPを作成しました! ({}件)", report.added.len()))
        }
        Ok(report) => StatusMessage::success(format!(
            "ZIPを作成しました! ({}件, {}件は取得できませんでした)",
            report.added.len(),
            report.skipped.len()
        )),
        Err(ExplorerError::EmptySelection) => StatusMessage::failure("絵文字が選択されていません"),
        Err(ExplorerError::ExportFailed(reason)) => StatusMessage::failure(reason.clone()),
        Err(_) => StatusMessage::failure("ZIP作成エラー"),
    }
}
