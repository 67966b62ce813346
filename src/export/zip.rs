//! 選択画像のZIPアーカイブ
//!
//! 画像は並行に取得し、取得できたものだけを選択順で格納する。
//! 1件も取得できなければ失敗。

use crate::error::{ExplorerError, Result};
use emoji_explorer_common::AssetRecord;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 既定のアーカイブ名
pub const ZIP_FILE_NAME: &str = "selected-emojis.zip";

/// 画像の取得元
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// ローカルの画像フォルダ（ファイル名で引く）
    Directory(PathBuf),
    /// 配信元URL（レコードの path を連結する）
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl AssetSource {
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        AssetSource::Directory(dir.into())
    }

    pub fn http(base_url: impl Into<String>) -> Self {
        AssetSource::Http {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// 1件分の画像バイト列を取得
    pub async fn fetch(&self, record: &AssetRecord) -> Result<Vec<u8>> {
        let failed = |reason: String| ExplorerError::FetchFailed {
            path: record.path.clone(),
            reason,
        };

        match self {
            AssetSource::Directory(dir) => {
                let name = Path::new(&record.filename);
                // フォルダ外を参照させない
                if name.components().count() != 1 || record.filename.contains("..") {
                    return Err(failed("不正なファイル名".into()));
                }
                tokio::fs::read(dir.join(name))
                    .await
                    .map_err(|e| failed(e.to_string()))
            }
            AssetSource::Http { base_url, client } => {
                let url = format!(
                    "{}/{}",
                    base_url.trim_end_matches('/'),
                    record.path.trim_start_matches('/')
                );
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| failed(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(failed(format!("HTTP {}", response.status())));
                }
                let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

/// 作成結果
#[derive(Debug, Clone, Default)]
pub struct ZipReport {
    pub bytes: Vec<u8>,
    /// 格納したエントリ名（選択順）
    pub added: Vec<String>,
    /// 取得に失敗したファイル名
    pub skipped: Vec<String>,
}

/// ZIPエントリ名用に英数字とドット以外を `_` に置換
pub fn sanitize_entry_name(filename: &str) -> String {
    lazy_static::lazy_static! {
        static ref UNSAFE_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9.]").unwrap();
    }
    UNSAFE_CHARS.replace_all(filename, "_").to_string()
}

/// 衝突する名前に連番を付ける（a.png → a_2.png）
fn unique_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name.as_str(), ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn fetch_progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// 選択順のレコードからZIPを作る
pub async fn build_zip(records: &[AssetRecord], source: &AssetSource) -> Result<ZipReport> {
    if records.is_empty() {
        return Err(ExplorerError::EmptySelection);
    }

    let pb = fetch_progress(records.len());
    let mut tasks = JoinSet::new();
    for (i, record) in records.iter().cloned().enumerate() {
        let source = source.clone();
        tasks.spawn(async move {
            let result = source.fetch(&record).await;
            (i, result)
        });
    }

    // 1件の失敗が他の取得を止めないよう、結果は個別に受ける
    let mut fetched: Vec<Option<Vec<u8>>> = vec![None; records.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((i, Ok(bytes))) => fetched[i] = Some(bytes),
            Ok((_, Err(e))) => tracing::warn!("{}", e),
            Err(e) => tracing::warn!("fetch task aborted: {}", e),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mut report = ZipReport::default();
    let mut used = HashSet::new();
    let mut entries = Vec::new();
    for (record, bytes) in records.iter().zip(fetched) {
        match bytes {
            Some(bytes) => {
                let name = unique_name(sanitize_entry_name(&record.filename), &mut used);
                report.added.push(name.clone());
                entries.push((name, bytes));
            }
            None => report.skipped.push(record.filename.clone()),
        }
    }

    if entries.is_empty() {
        return Err(ExplorerError::ExportFailed(
            "ZIPに追加できるファイルがありません".into(),
        ));
    }

    report.bytes = write_archive(&entries)?;
    Ok(report)
}

fn write_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let zip_failed = |e: zip::result::ZipError| ExplorerError::ExportFailed(format!("ZIP作成エラー: {}", e));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options).map_err(zip_failed)?;
        writer.write_all(bytes)?;
    }
    let cursor = writer.finish().map_err(zip_failed)?;
    Ok(cursor.into_inner())
}
