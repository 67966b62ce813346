//! 画像フォルダからメタデータストアを作る

mod labels;

pub use labels::{LabelFile, Labels, LABELS_FILE_NAME};

use crate::error::{ExplorerError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use emoji_explorer_common::{AssetRecord, MetadataStore};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// 画像拡張子か（大文字小文字を区別しない）
fn is_image_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// ファイル名から安定IDを生成（SHA-256の先頭8桁）
pub fn generate_id(file_name: &str) -> String {
    let digest = Sha256::digest(file_name.as_bytes());
    hex::encode(digest)[..8].to_string()
}

/// ISO-8601（ミリ秒, UTC）
fn iso_timestamp(time: std::time::SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 画像ファイル一覧（直下のみ・ファイル名順）
fn list_images(folder: &Path) -> Vec<(PathBuf, String)> {
    let mut images: Vec<(PathBuf, String)> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .map(|e| {
            let file_name = e.file_name().to_string_lossy().to_string();
            (e.into_path(), file_name)
        })
        .collect();

    images.sort_by(|a, b| a.1.cmp(&b.1));
    images
}

fn build_record(path: &Path, file_name: &str, url_prefix: &str, labels: &LabelFile) -> Result<AssetRecord> {
    let metadata = std::fs::metadata(path)?;
    // 作成日時が取れないファイルシステムでは更新日時で代用
    let created = metadata.created().or_else(|_| metadata.modified())?;
    let Labels { categories, tags } = labels.get(file_name);

    Ok(AssetRecord {
        id: generate_id(file_name),
        filename: file_name.to_string(),
        // 空白や#を含むファイル名でも有効な相対URLにする
        path: format!("{}/{}", url_prefix.trim_end_matches('/'), urlencoding::encode(file_name)),
        categories,
        tags,
        created: iso_timestamp(created),
        size: metadata.len(),
    })
}

fn scan_progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// フォルダを走査してレコード列を作る
///
/// 読めないファイルは警告を出してスキップする。
pub fn scan_folder(folder: &Path, url_prefix: &str) -> Result<Vec<AssetRecord>> {
    if !folder.exists() {
        return Err(ExplorerError::FolderNotFound(folder.display().to_string()));
    }

    let labels = LabelFile::load(folder)?;
    let images = list_images(folder);
    tracing::debug!(count = images.len(), labels = labels.len(), "scanning {}", folder.display());

    let pb = scan_progress(images.len());
    pb.set_message("scanning");

    let mut records: Vec<AssetRecord> = images
        .par_iter()
        .filter_map(|(path, file_name)| {
            let record = match build_record(path, file_name, url_prefix, &labels) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                    None
                }
            };
            pb.inc(1);
            record
        })
        .collect();
    pb.finish_and_clear();

    // ファイル名でソート
    records.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(records)
}

/// レコード列をメタデータストアにまとめる
pub fn build_store(records: Vec<AssetRecord>) -> MetadataStore {
    MetadataStore::new(records, iso_timestamp(std::time::SystemTime::now()))
}

/// メタデータストアをJSONで保存
pub fn write_store(store: &MetadataStore, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(store)?;
    std::fs::write(output, json)?;
    Ok(())
}
