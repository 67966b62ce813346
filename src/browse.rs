//! 対話式ブラウズ
//!
//! 端末上でグリッドを表示し、検索・カテゴリ・選択・エクスポートを操作する。

use crate::config::Config;
use crate::error::{ExplorerError, Result};
use crate::export::{AssetSource, SystemClipboard, TextSink, ZIP_FILE_NAME};
use crate::session::Session;
use dialoguer::{Confirm, Input, Select};
use emoji_explorer_common::{ExportFormat, GridCell, NavKey, ALL_CATEGORIES};

/// 一度に表示する最大行数
const MAX_ROWS: usize = 10;
const NAME_WIDTH: usize = 14;

const MENU: &[&str] = &[
    "検索語を入力",
    "カテゴリを選択",
    "選択のみ表示を切替",
    "フォーカス移動",
    "フォーカス中を選択/解除",
    "IDで選択/解除",
    "表示中をすべて選択",
    "選択をすべて解除",
    "エクスポート",
    "終了",
];

const EXPORT_FORMATS: [ExportFormat; 5] = [
    ExportFormat::PlainText,
    ExportFormat::Html,
    ExportFormat::Css,
    ExportFormat::Markdown,
    ExportFormat::Zip,
];

fn prompt_error(e: dialoguer::Error) -> ExplorerError {
    ExplorerError::Prompt(e.to_string())
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        format!("{:<width$}", name, width = width)
    } else {
        let head: String = name.chars().take(width - 1).collect();
        format!("{}…", head)
    }
}

/// グリッドを文字列に描画（■=選択中, >=フォーカス）
pub fn render_grid(cells: &[GridCell], columns: usize, max_rows: usize) -> String {
    let columns = columns.max(1);
    let shown = cells.len().min(columns * max_rows);

    let mut lines: Vec<String> = cells[..shown]
        .chunks(columns)
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let focus = if cell.focused { '>' } else { ' ' };
                    let mark = if cell.aria_selected { '■' } else { '□' };
                    format!("{}{} {}", focus, mark, truncate(&cell.filename, NAME_WIDTH))
                })
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string()
        })
        .collect();

    if cells.len() > shown {
        lines.push(format!("... 他{}件", cells.len() - shown));
    }
    lines.join("\n")
}

fn render(session: &Session) {
    let explorer = session.explorer();
    let filter = explorer.filter();
    let visible = explorer.visible();

    println!();
    println!(
        "検索: {:?} / カテゴリ: {} / 選択のみ: {} / 表示 {}件",
        filter.query,
        filter.category,
        if filter.show_selected_only { "ON" } else { "OFF" },
        visible.len()
    );
    if visible.is_empty() {
        println!("（該当する絵文字はありません）");
    } else {
        println!("{}", render_grid(&explorer.grid_cells(), session.options().grid_columns, MAX_ROWS));
    }
    if let Some(error) = explorer.last_error() {
        println!("⚠ 検索エラー: {}", error);
    }
    println!("{}", explorer.selection_summary());
    if let Some(status) = session.status() {
        println!("» {}", status);
    }
}

async fn prompt_query(session: &mut Session) -> Result<()> {
    let query: String = Input::new()
        .with_prompt("検索語（空で解除）")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    session.set_query(&query);
    session.settle().await;
    Ok(())
}

fn prompt_category(session: &mut Session) -> Result<()> {
    let mut categories = vec![ALL_CATEGORIES.to_string()];
    categories.extend(session.explorer().categories());
    let current = session.explorer().filter().category.clone();
    let default = categories.iter().position(|c| *c == current).unwrap_or(0);

    let choice = Select::new()
        .with_prompt("カテゴリ")
        .items(categories.as_slice())
        .default(default)
        .interact()
        .map_err(prompt_error)?;
    session.set_category(&categories[choice]);
    Ok(())
}

fn prompt_focus(session: &mut Session) -> Result<()> {
    let key: String = Input::new()
        .with_prompt("キー (up/down/left/right/home/end)")
        .interact_text()
        .map_err(prompt_error)?;
    match key.trim().parse::<NavKey>() {
        Ok(key) => {
            session.move_focus(key);
        }
        Err(e) => println!("⚠ {}", e),
    }
    Ok(())
}

fn prompt_toggle(session: &mut Session) -> Result<()> {
    let id: String = Input::new()
        .with_prompt("絵文字ID")
        .interact_text()
        .map_err(prompt_error)?;
    match session.toggle(id.trim()) {
        Ok(true) => println!("✔ 選択しました"),
        Ok(false) => println!("✔ 選択を解除しました"),
        Err(e) => println!("⚠ {}", e),
    }
    Ok(())
}

async fn prompt_export(session: &mut Session, config: &Config) -> Result<()> {
    let labels: Vec<&str> = EXPORT_FORMATS.iter().map(|f| f.label()).collect();
    let choice = Select::new()
        .with_prompt("形式")
        .items(labels.as_slice())
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    let format = EXPORT_FORMATS[choice];

    // 失敗はステータスに出るので、ここでは止めない
    if format.is_textual() {
        if let Err(e) = session.export_text(format, TextSink::Clipboard(&SystemClipboard)) {
            tracing::debug!("clipboard export failed: {}", e);
        }
    } else {
        let source = match &config.base_url {
            Some(url) => AssetSource::http(url.clone()),
            None => AssetSource::directory(config.emojis_dir.clone()),
        };
        match session.export_zip(&source).await {
            Ok(report) => {
                std::fs::write(ZIP_FILE_NAME, &report.bytes)?;
                println!("✔ ZIP出力: {}", ZIP_FILE_NAME);
            }
            Err(e) => tracing::debug!("zip export failed: {}", e),
        }
    }
    Ok(())
}

/// 対話ループ
pub async fn run(session: &mut Session, config: &Config) -> Result<()> {
    loop {
        render(session);

        let choice = Select::new()
            .with_prompt("操作")
            .items(MENU)
            .default(0)
            .interact()
            .map_err(prompt_error)?;

        match choice {
            0 => prompt_query(session).await?,
            1 => prompt_category(session)?,
            2 => {
                let on = !session.explorer().filter().show_selected_only;
                session.set_show_selected_only(on);
            }
            3 => prompt_focus(session)?,
            4 => {
                if session.activate_focused().is_none() {
                    println!("⚠ フォーカス中の絵文字がありません");
                }
            }
            5 => prompt_toggle(session)?,
            6 => {
                let added = session.select_all_visible();
                println!("✔ {}件を追加", added);
            }
            7 => {
                let confirmed = Confirm::new()
                    .with_prompt("選択をすべて解除しますか?")
                    .default(false)
                    .interact()
                    .map_err(prompt_error)?;
                if confirmed {
                    session.reset_selection();
                }
            }
            8 => prompt_export(session, config).await?,
            _ => break,
        }
    }
    Ok(())
}
