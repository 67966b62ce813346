//! テキスト系エクスポートの生成
//!
//! いずれも選択順のレコード列を受け取る純関数。

use crate::types::AssetRecord;

/// HTML属性値のエスケープ
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Markdownテーブルのセル用エスケープ
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// ファイル名を1行ずつ
pub fn encode_plain_text(records: &[AssetRecord]) -> String {
    records
        .iter()
        .map(|r| r.filename.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// インライン表示用の img タグ（区切りなしで連結）
pub fn encode_html(records: &[AssetRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "<img src=\"{}\" alt=\"{}\" style=\"width: 24px; height: 24px; vertical-align: middle; margin: 0 2px;\" />",
                escape_attr(&r.path),
                escape_attr(&r.filename)
            )
        })
        .collect()
}

/// 背景画像として使うCSSクラス
pub fn encode_css(records: &[AssetRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                ".emoji-{} {{\n  display: inline-block;\n  width: 24px;\n  height: 24px;\n  background-image: url('{}');\n  background-size: contain;\n  background-repeat: no-repeat;\n  background-position: center;\n  vertical-align: middle;\n}}",
                r.id, r.path
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdownテーブル
pub fn encode_markdown(records: &[AssetRecord]) -> String {
    let mut lines = vec!["| Emoji | Filename |".to_string(), "|---|---|".to_string()];
    lines.extend(records.iter().map(|r| {
        let name = escape_cell(&r.filename);
        format!("| ![{}]({}) | {} |", name, r.path, name)
    }));
    lines.join("\n")
}
