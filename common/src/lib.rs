//! Emoji Explorer Common Library
//!
//! CLIと各フロントエンドで共有される型・検索インデックス・選択ステート

pub mod types;
pub mod error;
pub mod related;
pub mod index;
pub mod query;
pub mod selection;
pub mod navigation;
pub mod explorer;
pub mod export;

/// カテゴリ未指定を表す値
pub const ALL_CATEGORIES: &str = "all";

pub use types::{AssetRecord, MetadataStore};
pub use error::{Error, Result};
pub use related::{RelatedRule, RelatedTerms, RuleTable};
pub use index::{EntryMeta, SearchIndex, SearchIndexEntry};
pub use query::{QueryService, RankedHit, SearchService};
pub use selection::{MemorySelectionStore, SelectionState, SelectionStore, SELECTION_STORAGE_KEY};
pub use navigation::NavKey;
pub use explorer::{Explorer, ExplorerEvent, FilterState, GridCell, SearchOutcome, SearchTicket, VisibleSet};
pub use export::{ExportFormat, StatusKind, StatusMessage};
