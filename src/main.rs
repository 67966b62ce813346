use anyhow::Context;
use clap::Parser;
use emoji_explorer::{browse, cli, config, error, export, indexer, logging, persist, scanner, session};
use cli::{Cli, Commands};
use config::Config;
use emoji_explorer_common::{
    AssetRecord, ExportFormat, MemorySelectionStore, QueryService, SearchService, SelectionStore,
};
use error::ExplorerError;
use export::{AssetSource, SystemClipboard, TextSink, ZIP_FILE_NAME};
use session::{Session, SessionOptions};
use std::sync::Arc;

/// 検索インデックスを読む（無ければ未ロードのまま全件表示にフォールバック）
fn load_search_service(config: &Config) -> Arc<dyn SearchService> {
    match QueryService::load(&config.index_path) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::warn!("インデックスを読み込めません ({}): {}", config.index_path.display(), e);
            Arc::new(QueryService::unloaded())
        }
    }
}

fn open_session(
    config: &Config,
    records: Vec<AssetRecord>,
    search: Arc<dyn SearchService>,
    store: Box<dyn SelectionStore>,
) -> Session {
    Session::new(records, search, store, SessionOptions::from_config(config))
}

fn file_store(config: &Config) -> error::Result<Box<dyn SelectionStore>> {
    Ok(Box::new(persist::FileSelectionStore::new(config.selection_file()?)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load().context("設定の読み込みに失敗しました")?;

    match cli.command {
        Commands::Scan { folder, output, url_prefix } => {
            println!("🔍 emoji-explorer - スキャン\n");
            let folder = folder.unwrap_or_else(|| config.emojis_dir.clone());
            let output = output.unwrap_or_else(|| config.metadata_path.clone());
            let url_prefix = url_prefix.unwrap_or_else(|| config.url_prefix.clone());

            println!("[1/2] 画像をスキャン中...");
            let records = scanner::scan_folder(&folder, &url_prefix)?;
            if records.is_empty() {
                return Err(ExplorerError::NoAssetsFound(folder.display().to_string()).into());
            }
            println!("✔ {}件の画像を検出\n", records.len());

            println!("[2/2] メタデータを保存中...");
            let store = scanner::build_store(records);
            scanner::write_store(&store, &output)?;
            println!("✔ メタデータを保存: {}", output.display());

            let categories = store.categories();
            if !categories.is_empty() {
                println!("  カテゴリ: {}", categories.join(", "));
            }
        }

        Commands::Index { metadata, output } => {
            println!("📚 emoji-explorer - インデックス生成\n");
            let metadata = metadata.unwrap_or_else(|| config.metadata_path.clone());
            let output = output.unwrap_or_else(|| config.index_path.clone());

            let report = indexer::build_index(&metadata, &output)
                .with_context(|| format!("インデックスを生成できませんでした: {}", output.display()))?;
            println!(
                "✔ {}件 / {}語 ({} bytes) を出力: {}",
                report.documents,
                report.terms,
                report.bytes,
                output.display()
            );
        }

        Commands::Search { query, category, limit } => {
            let store = indexer::load_store(&config.metadata_path)?;
            let search = load_search_service(&config);
            let selection = Box::new(MemorySelectionStore::default());
            let mut session = open_session(&config, store.emojis, search, selection);

            session.set_category(&category);
            session.set_query(&query);
            session.settle().await;

            let explorer = session.explorer();
            if let Some(error) = explorer.last_error() {
                return Err(anyhow::anyhow!("検索に失敗しました: {}", error));
            }
            let visible = explorer.visible();
            println!("{}件ヒット", visible.len());
            for record in visible.records().iter().take(limit) {
                println!("  {}  {}  [{}]", record.id, record.filename, record.categories.join(", "));
            }
        }

        Commands::Browse => {
            let store = indexer::load_store(&config.metadata_path)?;
            let search = load_search_service(&config);
            let mut session = open_session(&config, store.emojis, search, file_store(&config)?);
            browse::run(&mut session, &config).await?;
        }

        Commands::Selection { toggle, clear, list } => {
            let store = indexer::load_store(&config.metadata_path)?;
            let search: Arc<dyn SearchService> = Arc::new(QueryService::unloaded());
            let mut session = open_session(&config, store.emojis, search, file_store(&config)?);

            if clear {
                session.reset_selection();
                println!("✔ 選択をすべて解除しました");
            }
            for id in &toggle {
                match session.toggle(id)? {
                    true => println!("✔ 選択: {}", id),
                    false => println!("✔ 解除: {}", id),
                }
            }

            if list || (toggle.is_empty() && !clear) {
                println!("{}", session.explorer().selection_summary());
                for record in session.explorer().selected_records() {
                    println!("  {}  {}", record.id, record.filename);
                }
            }
        }

        Commands::Export { format, ids, output, clipboard, assets, base_url } => {
            let store = indexer::load_store(&config.metadata_path)?;
            let selection: Box<dyn SelectionStore> = if ids.is_empty() {
                file_store(&config)?
            } else {
                if let Some(unknown) = ids.iter().find(|id| !store.emojis.iter().any(|r| &r.id == *id)) {
                    return Err(ExplorerError::UnknownAsset(unknown.clone()).into());
                }
                Box::new(MemorySelectionStore::new(ids))
            };
            let search: Arc<dyn SearchService> = Arc::new(QueryService::unloaded());
            let mut session = open_session(&config, store.emojis, search, selection);

            if format == ExportFormat::Zip {
                let source = match base_url.or_else(|| config.base_url.clone()) {
                    Some(url) => AssetSource::http(url),
                    None => AssetSource::directory(assets.unwrap_or_else(|| config.emojis_dir.clone())),
                };
                let result = session.export_zip(&source).await;
                if let Some(status) = session.status() {
                    println!("{}", status);
                }
                let report = result?;
                let output = output.unwrap_or_else(|| ZIP_FILE_NAME.into());
                std::fs::write(&output, &report.bytes)
                    .with_context(|| format!("ZIPを書き込めません: {}", output.display()))?;
                println!("✔ ZIP出力: {}", output.display());
            } else {
                let clipboard_impl = SystemClipboard;
                let sink = match (&output, clipboard) {
                    (_, true) => TextSink::Clipboard(&clipboard_impl),
                    (Some(path), false) => TextSink::File(path),
                    (None, false) => TextSink::Stdout,
                };
                let result = session.export_text(format, sink);
                if let Some(status) = session.status() {
                    // 標準出力は本文に使うのでステータスは stderr へ
                    eprintln!("{}", status);
                }
                result?;
            }
        }

        Commands::Config { show, set_emojis_dir, set_base_url } => {
            let mut config = config;

            if let Some(dir) = set_emojis_dir {
                config.set_emojis_dir(dir)?;
                println!("✔ 画像フォルダを設定しました");
            }

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ 配信元URLを設定しました");
            }

            if show {
                println!("設定 ({}):", Config::config_path()?.display());
                println!("  画像フォルダ: {}", config.emojis_dir.display());
                println!("  URL接頭辞: {}", config.url_prefix);
                println!("  配信元URL: {}", config.base_url.as_deref().unwrap_or("未設定"));
                println!("  メタデータ: {}", config.metadata_path.display());
                println!("  インデックス: {}", config.index_path.display());
                println!("  選択の保存先: {}", config.selection_file()?.display());
                println!("  検索タイムアウト: {}ms", config.search_timeout_ms);
                println!("  グリッド列数: {}", config.grid_columns);
            }
        }
    }

    Ok(())
}
