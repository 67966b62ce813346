use clap::{Parser, Subcommand};
use emoji_explorer_common::ExportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "emoji-explorer")]
#[command(about = "絵文字ギャラリーの索引生成・検索・選択・エクスポートツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像フォルダを走査してメタデータJSONを出力
    Scan {
        /// 画像フォルダ（省略時は設定値）
        folder: Option<PathBuf>,

        /// 出力JSONファイル（省略時は設定値）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// レコードの path に付ける接頭辞
        #[arg(long)]
        url_prefix: Option<String>,
    },

    /// メタデータから検索インデックスを生成
    Index {
        /// メタデータJSONファイル
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// 出力インデックスファイル
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// インデックスを検索
    Search {
        /// 検索語
        #[arg(required = true)]
        query: String,

        /// カテゴリで絞り込み
        #[arg(short, long, default_value = "all")]
        category: String,

        /// 表示件数
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 対話的に絞り込み・選択
    Browse,

    /// 保存済みの選択を表示/編集
    Selection {
        /// 選択を反転するID
        #[arg(short, long)]
        toggle: Vec<String>,

        /// 選択をすべて解除
        #[arg(long)]
        clear: bool,

        /// 選択一覧を表示
        #[arg(short, long)]
        list: bool,
    },

    /// 選択中の絵文字をエクスポート
    Export {
        /// 出力形式 (text/html/css/markdown/zip)
        #[arg(short, long, default_value = "text")]
        format: ExportFormat,

        /// 対象ID（省略時は保存済みの選択）
        #[arg(long)]
        ids: Vec<String>,

        /// 出力ファイル（ZIPは省略時 selected-emojis.zip）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// クリップボードにコピー
        #[arg(long)]
        clipboard: bool,

        /// 画像の取得元フォルダ（ZIP用、省略時は設定値）
        #[arg(long)]
        assets: Option<PathBuf>,

        /// 画像の配信元URL（ZIP用）
        #[arg(long)]
        base_url: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 画像フォルダを設定
        #[arg(long)]
        set_emojis_dir: Option<PathBuf>,

        /// 配信元URLを設定
        #[arg(long)]
        set_base_url: Option<String>,
    },
}
