//! エクスポート（文字列形式・ZIP）の統合テスト

use emoji_explorer::error::ExplorerError;
use emoji_explorer::export::{build_zip, AssetSource, Clipboard, TextSink};
use emoji_explorer::session::{Session, SessionOptions};
use emoji_explorer_common::{AssetRecord, ExportFormat, MemorySelectionStore, QueryService, StatusKind};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn record(id: &str, filename: &str) -> AssetRecord {
    AssetRecord {
        id: id.to_string(),
        filename: filename.to_string(),
        path: format!("/emojis/{}", filename),
        ..Default::default()
    }
}

fn session_with(records: Vec<AssetRecord>, selected: &[&str]) -> Session {
    Session::new(
        records,
        Arc::new(QueryService::unloaded()),
        Box::new(MemorySelectionStore::new(selected.iter().map(|s| s.to_string()).collect())),
        SessionOptions::default(),
    )
}

fn zip_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("ZIPとして読めない");
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn write_assets(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), format!("bytes of {}", name)).unwrap();
    }
}

#[test]
fn test_plain_text_in_selection_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("names.txt");
    let mut session = session_with(
        vec![record("1", "a.png"), record("2", "b.png"), record("3", "c.png")],
        &["3", "1"],
    );

    session.export_text(ExportFormat::PlainText, TextSink::File(&output)).unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "c.png\na.png");

    let status = session.status().expect("ステータスが出ていない");
    assert_eq!(status.kind, StatusKind::Success);
}

#[test]
fn test_html_export_escapes_attributes() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("emojis.html");
    let mut session = session_with(vec![record("1", "a\"b.png")], &["1"]);

    session.export_text(ExportFormat::Html, TextSink::File(&output)).unwrap();
    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.starts_with("<img"));
    assert!(html.contains("&quot;"), "属性値がエスケープされていない: {}", html);
}

#[test]
fn test_empty_selection_reports_failure() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("never.txt");
    let mut session = session_with(vec![record("1", "a.png")], &[]);

    let result = session.export_text(ExportFormat::Markdown, TextSink::File(&output));
    assert!(matches!(result, Err(ExplorerError::EmptySelection)));
    assert!(!output.exists());
    assert!(session.status().map(|s| s.is_failure()).unwrap_or(false));
}

struct BrokenClipboard;

impl Clipboard for BrokenClipboard {
    fn write_text(&self, _text: &str) -> emoji_explorer::error::Result<()> {
        Err(ExplorerError::ClipboardWriteFailed("no clipboard".to_string()))
    }
}

#[test]
fn test_clipboard_failure_keeps_session_usable() {
    let mut session = session_with(vec![record("1", "a.png")], &["1"]);

    let result = session.export_text(ExportFormat::Css, TextSink::Clipboard(&BrokenClipboard));
    assert!(matches!(result, Err(ExplorerError::ClipboardWriteFailed(_))));
    assert!(session.status().map(|s| s.is_failure()).unwrap_or(false), "失敗ステータスが出ていない");
    assert_eq!(session.explorer().selected_ids(), &["1"], "失敗しても選択は変わらない");
}

#[tokio::test]
async fn test_zip_skips_failed_fetch() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_assets(dir.path(), &["one.png", "three.gif"]);
    let mut session = session_with(
        vec![record("1", "one.png"), record("2", "missing.png"), record("3", "three.gif")],
        &["3", "2", "1"],
    );

    let report = session
        .export_zip(&AssetSource::directory(dir.path()))
        .await
        .expect("1件失敗でもZIPは作られるべき");

    assert_eq!(report.added, vec!["three.gif", "one.png"]);
    assert_eq!(report.skipped, vec!["missing.png"]);
    assert_eq!(zip_names(&report.bytes), vec!["three.gif", "one.png"]);

    let status = session.status().expect("ステータスが出ていない");
    assert_eq!(status.kind, StatusKind::Success, "部分的な成功は成功扱い");
    assert_eq!(session.explorer().selected_ids(), &["3", "2", "1"]);
}

#[tokio::test]
async fn test_zip_all_fetches_failed() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut session = session_with(vec![record("1", "x.png"), record("2", "y.png")], &["1", "2"]);

    let result = session.export_zip(&AssetSource::directory(dir.path())).await;
    assert!(matches!(result, Err(ExplorerError::ExportFailed(_))));
    assert!(session.status().map(|s| s.is_failure()).unwrap_or(false));
    assert_eq!(session.explorer().selected_ids().len(), 2, "失敗しても選択は変わらない");
}

#[tokio::test]
async fn test_zip_entry_names_are_sanitized_and_unique() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_assets(dir.path(), &["a b.png", "a_b.png"]);
    let records = vec![record("1", "a b.png"), record("2", "a_b.png")];

    let report = build_zip(&records, &AssetSource::directory(dir.path())).await.unwrap();
    assert_eq!(zip_names(&report.bytes), vec!["a_b.png", "a_b_2.png"]);

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(report.bytes)).unwrap();
    let mut content = String::new();
    archive.by_name("a_b_2.png").unwrap().read_to_string(&mut content).unwrap();
    assert_eq!(content, "bytes of a_b.png");
}

/// `/emojis/ok.png` だけを返す最小のHTTPサーバ
async fn serve_assets() -> std::net::SocketAddr {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                let target = head.split_whitespace().nth(1).unwrap_or("");
                let (status, body): (&str, &[u8]) = if target == "/emojis/ok.png" {
                    ("200 OK", b"ok bytes")
                } else {
                    ("404 Not Found", b"")
                };
                let header = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

#[tokio::test]
async fn test_zip_over_http_skips_not_found() {
    let addr = serve_assets().await;
    let mut session = session_with(vec![record("1", "ok.png"), record("2", "missing.png")], &["1", "2"]);

    let report = session
        .export_zip(&AssetSource::http(format!("http://{}/", addr)))
        .await
        .expect("404が1件あってもZIPは作られるべき");

    assert_eq!(report.added, vec!["ok.png"]);
    assert_eq!(report.skipped, vec!["missing.png"]);
    assert_eq!(zip_names(&report.bytes), vec!["ok.png"]);

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(report.bytes)).unwrap();
    let mut content = String::new();
    archive.by_name("ok.png").unwrap().read_to_string(&mut content).unwrap();
    assert_eq!(content, "ok bytes");

    let status = session.status().expect("ステータスが出ていない");
    assert_eq!(status.kind, StatusKind::Success);
}

#[tokio::test]
async fn test_zip_over_http_all_not_found() {
    let addr = serve_assets().await;
    let mut session = session_with(vec![record("1", "gone.png")], &["1"]);

    let result = session.export_zip(&AssetSource::http(format!("http://{}", addr))).await;
    assert!(matches!(result, Err(ExplorerError::ExportFailed(_))));
    assert!(session.status().map(|s| s.is_failure()).unwrap_or(false));
}
