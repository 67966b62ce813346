//! 検索・カテゴリ・選択を束ねる表示ステートマシン
//!
//! 表示集合（VisibleSet）は
//! （直近の検索結果 or 全件, カテゴリ, 選択のみ表示, 選択ID）
//! から毎回まるごと再計算し、`Arc` で差し替える。
//! 非同期検索はチケットの連番で管理し、最新チケット以外の応答は捨てる。

use crate::error::Result;
use crate::navigation::{next_focus, NavKey};
use crate::query::RankedHit;
use crate::selection::SelectionState;
use crate::types::AssetRecord;
use crate::ALL_CATEGORIES;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// フィルタ条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    pub category: String,
    pub show_selected_only: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
            show_selected_only: false,
        }
    }
}

impl FilterState {
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// 発行済み検索リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

/// 検索応答の適用結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// ヒットを表示集合に反映
    Applied,
    /// 古いリクエストの応答なので破棄
    Stale,
    /// インデックス未ロードのため全件表示にフォールバック
    FellBack,
    /// 検索失敗（表示集合は空）
    Failed,
}

/// ステートマシンが発行するイベント
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerEvent {
    VisibleSetChanged { version: u64, len: usize },
    SelectionChanged { ids: Vec<String> },
    FocusChanged(Option<usize>),
    SearchStarted { seq: u64 },
    SearchFinished { seq: u64, hits: usize },
    SearchDiscarded { seq: u64 },
    SearchFailed { seq: u64, message: String },
}

/// 表示集合のスナップショット（差し替え専用）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    version: u64,
    records: Vec<AssetRecord>,
}

impl VisibleSet {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&AssetRecord> {
        self.records.get(index)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// グリッド1セル分の表示情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub index: usize,
    pub id: String,
    pub filename: String,
    pub path: String,
    pub aria_selected: bool,
    pub focused: bool,
    /// ロービングtabindex（0 または -1）
    pub tab_index: i32,
}

/// 表示集合の元になる結果
#[derive(Debug, Clone)]
enum BaseResults {
    All,
    Hits(Vec<usize>),
    Failed,
}

/// 表示・選択ステートマシン
#[derive(Debug)]
pub struct Explorer {
    records: Vec<AssetRecord>,
    positions: HashMap<String, usize>,
    filter: FilterState,
    selection: SelectionState,
    base: BaseResults,
    visible: Arc<VisibleSet>,
    focused: Option<usize>,
    latest_seq: u64,
    is_searching: bool,
    last_error: Option<String>,
    events: Vec<ExplorerEvent>,
}

impl Explorer {
    pub fn new(records: Vec<AssetRecord>) -> Self {
        let positions = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        let mut explorer = Self {
            records,
            positions,
            filter: FilterState::default(),
            selection: SelectionState::new(),
            base: BaseResults::All,
            visible: Arc::new(VisibleSet::default()),
            focused: None,
            latest_seq: 0,
            is_searching: false,
            last_error: None,
            events: Vec::new(),
        };
        explorer.recompute();
        explorer.events.clear();
        explorer
    }

    /// 永続化された選択で初期化（ストアに無いIDは捨てる）
    pub fn with_selection<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| self.positions.contains_key(id));
        self.selection = SelectionState::from_ids(known);
        self
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&AssetRecord> {
        self.positions.get(id).and_then(|&i| self.records.get(i))
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selected_ids(&self) -> &[String] {
        self.selection.ids()
    }

    /// 選択順のレコード列（エクスポート入力）
    pub fn selected_records(&self) -> Vec<AssetRecord> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.record(id).cloned())
            .collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn visible(&self) -> Arc<VisibleSet> {
        Arc::clone(&self.visible)
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    pub fn is_searching(&self) -> bool {
        self.is_searching
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 最後に発行したチケット番号
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// カテゴリ選択肢
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| r.categories.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 溜まったイベントを取り出す
    pub fn drain_events(&mut self) -> Vec<ExplorerEvent> {
        std::mem::take(&mut self.events)
    }

    /// クエリ変更。空白のみなら即時に全件へ戻し、そうでなければ検索チケットを返す
    pub fn set_query(&mut self, text: &str) -> Option<SearchTicket> {
        self.filter.query = text.to_string();
        // 新しい入力が来た時点で以前の応答はすべて古い
        self.latest_seq += 1;

        if !self.filter.has_query() {
            self.is_searching = false;
            self.last_error = None;
            self.base = BaseResults::All;
            self.recompute();
            return None;
        }

        // 応答が来るまで現在の表示集合は維持する
        self.is_searching = true;
        self.events.push(ExplorerEvent::SearchStarted {
            seq: self.latest_seq,
        });
        Some(SearchTicket {
            seq: self.latest_seq,
            query: text.trim().to_string(),
        })
    }

    /// 検索応答を適用（最新チケットのみ）
    pub fn apply_search(&mut self, seq: u64, result: Result<Vec<RankedHit>>) -> SearchOutcome {
        if seq != self.latest_seq || !self.is_searching {
            self.events.push(ExplorerEvent::SearchDiscarded { seq });
            return SearchOutcome::Stale;
        }
        self.is_searching = false;

        let outcome = match result {
            Ok(hits) => {
                let mut seen = HashSet::new();
                let indices: Vec<usize> = hits
                    .iter()
                    .filter_map(|hit| self.positions.get(&hit.id).copied())
                    .filter(|i| seen.insert(*i))
                    .collect();
                self.events.push(ExplorerEvent::SearchFinished {
                    seq,
                    hits: indices.len(),
                });
                self.base = BaseResults::Hits(indices);
                self.last_error = None;
                SearchOutcome::Applied
            }
            Err(e) if e.is_index_unavailable() => {
                self.base = BaseResults::All;
                self.last_error = None;
                SearchOutcome::FellBack
            }
            Err(e) => {
                let message = e.to_string();
                self.events.push(ExplorerEvent::SearchFailed {
                    seq,
                    message: message.clone(),
                });
                self.base = BaseResults::Failed;
                self.last_error = Some(message);
                SearchOutcome::Failed
            }
        };

        self.recompute();
        outcome
    }

    pub fn set_category(&mut self, category: &str) {
        self.filter.category = category.to_string();
        self.recompute();
    }

    pub fn set_show_selected_only(&mut self, on: bool) {
        self.filter.show_selected_only = on;
        self.recompute();
    }

    /// 選択反転。未知のIDなら None
    pub fn toggle_selection(&mut self, id: &str) -> Option<bool> {
        if !self.positions.contains_key(id) {
            return None;
        }
        let selected = self.selection.toggle(id);
        self.selection_changed();
        Some(selected)
    }

    /// 表示中のものをすべて選択に加える。追加数を返す
    pub fn select_all_visible(&mut self) -> usize {
        let visible = Arc::clone(&self.visible);
        let added = self.selection.extend_ids(visible.records().iter().map(|r| r.id.as_str()));
        if added > 0 {
            self.selection_changed();
        }
        added
    }

    pub fn reset_selection(&mut self) {
        self.selection.clear();
        self.set_focused(None);
        self.selection_changed();
    }

    /// キー操作でフォーカス移動
    pub fn move_focus(&mut self, key: NavKey, cols: usize) -> Option<usize> {
        let next = next_focus(self.focused, key, cols, self.visible.len());
        self.set_focused(next);
        self.focused
    }

    /// ポインタ操作などで直接フォーカス。範囲外なら false
    pub fn focus(&mut self, index: usize) -> bool {
        if index >= self.visible.len() {
            return false;
        }
        self.set_focused(Some(index));
        true
    }

    pub fn clear_focus(&mut self) {
        self.set_focused(None);
    }

    /// Enter/Space: フォーカス中のセルの選択を反転
    pub fn activate_focused(&mut self) -> Option<bool> {
        let id = self.focused.and_then(|i| self.visible.get(i)).map(|r| r.id.clone())?;
        self.toggle_selection(&id)
    }

    /// グリッド描画用のセル列
    pub fn grid_cells(&self) -> Vec<GridCell> {
        let tab_stop = self.focused.unwrap_or(0);
        self.visible
            .records()
            .iter()
            .enumerate()
            .map(|(index, r)| GridCell {
                index,
                id: r.id.clone(),
                filename: r.filename.clone(),
                path: r.path.clone(),
                aria_selected: self.selection.contains(&r.id),
                focused: self.focused == Some(index),
                tab_index: if index == tab_stop { 0 } else { -1 },
            })
            .collect()
    }

    /// 選択件数ラベル
    pub fn selection_summary(&self) -> String {
        format!("{}件の絵文字を選択中", self.selection.len())
    }

    fn selection_changed(&mut self) {
        self.events.push(ExplorerEvent::SelectionChanged {
            ids: self.selection.ids().to_vec(),
        });
        // 選択のみ表示中は選択IDが表示集合の入力になる
        if self.filter.show_selected_only {
            self.recompute();
        }
    }

    fn set_focused(&mut self, focused: Option<usize>) {
        if self.focused != focused {
            self.focused = focused;
            self.events.push(ExplorerEvent::FocusChanged(focused));
        }
    }

    fn recompute(&mut self) {
        let selected = self.selection.id_set();
        let category = self.filter.category.as_str();
        let selected_only = self.filter.show_selected_only;

        let candidates: Vec<usize> = match &self.base {
            BaseResults::All => (0..self.records.len()).collect(),
            BaseResults::Hits(indices) => indices.clone(),
            BaseResults::Failed => Vec::new(),
        };

        let records: Vec<AssetRecord> = candidates
            .into_iter()
            .filter_map(|i| self.records.get(i))
            .filter(|r| r.matches_category(category))
            .filter(|r| !selected_only || selected.contains(r.id.as_str()))
            .cloned()
            .collect();

        let version = self.visible.version + 1;
        let len = records.len();
        self.visible = Arc::new(VisibleSet { version, records });
        self.events.push(ExplorerEvent::VisibleSetChanged { version, len });

        if self.focused.is_some_and(|f| f >= len) {
            self.set_focused(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::index::EntryMeta;

    fn record(id: &str, path: &str, categories: &[&str]) -> AssetRecord {
        AssetRecord {
            id: id.to_string(),
            filename: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    fn hit(id: &str) -> RankedHit {
        RankedHit {
            id: id.to_string(),
            score: 1.0,
            meta: EntryMeta {
                id: id.to_string(),
                ..Default::default()
            },
        }
    }

    fn explorer() -> Explorer {
        Explorer::new(vec![
            record("1", "/e/meow1.png", &["cat"]),
            record("2", "/e/dog1.png", &["dog"]),
            record("3", "/e/cat2.png", &["cat", "cute"]),
            record("4", "/e/party.gif", &[]),
        ])
    }

    fn visible_ids(explorer: &Explorer) -> Vec<String> {
        explorer.visible().records().iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_initial_visible_is_everything() {
        let explorer = explorer();
        assert_eq!(visible_ids(&explorer), vec!["1", "2", "3", "4"]);
        assert_eq!(explorer.focused_index(), None);
        assert!(!explorer.is_searching());
    }

    #[test]
    fn test_category_filter_without_query() {
        let mut explorer = explorer();
        explorer.set_category("dog");
        assert_eq!(visible_ids(&explorer), vec!["2"]);
        explorer.set_category("all");
        assert_eq!(visible_ids(&explorer).len(), 4);
    }

    #[test]
    fn test_category_exact_match_only() {
        let mut explorer = explorer();
        explorer.set_category("cu");
        assert!(explorer.visible().is_empty());
    }

    #[test]
    fn test_query_keeps_previous_visible_while_pending() {
        let mut explorer = explorer();
        let before = explorer.visible();
        let ticket = explorer.set_query("cat").expect("チケットが発行されない");
        assert!(explorer.is_searching());
        assert_eq!(explorer.visible(), before);

        let outcome = explorer.apply_search(ticket.seq, Ok(vec![hit("3"), hit("1")]));
        assert_eq!(outcome, SearchOutcome::Applied);
        assert!(!explorer.is_searching());
        // ランク順を保つ
        assert_eq!(visible_ids(&explorer), vec!["3", "1"]);
    }

    #[test]
    fn test_blank_query_is_synchronous() {
        let mut explorer = explorer();
        let ticket = explorer.set_query("cat").unwrap();
        explorer.apply_search(ticket.seq, Ok(vec![hit("1")]));
        assert!(explorer.set_query("   ").is_none());
        assert!(!explorer.is_searching());
        assert_eq!(visible_ids(&explorer).len(), 4);
    }

    #[test]
    fn test_last_request_wins() {
        let mut explorer = explorer();
        let c = explorer.set_query("c").unwrap();
        let ca = explorer.set_query("ca").unwrap();
        let cat = explorer.set_query("cat").unwrap();
        assert!(c.seq < ca.seq && ca.seq < cat.seq);

        assert_eq!(explorer.apply_search(cat.seq, Ok(vec![hit("3")])), SearchOutcome::Applied);
        assert_eq!(explorer.apply_search(ca.seq, Ok(vec![hit("1"), hit("3")])), SearchOutcome::Stale);
        assert_eq!(
            explorer.apply_search(c.seq, Ok(vec![hit("1"), hit("2"), hit("3")])),
            SearchOutcome::Stale
        );
        assert_eq!(visible_ids(&explorer), vec!["3"]);
    }

    #[test]
    fn test_response_after_clearing_query_is_discarded() {
        let mut explorer = explorer();
        let ticket = explorer.set_query("dog").unwrap();
        explorer.set_query("");
        assert_eq!(explorer.apply_search(ticket.seq, Ok(vec![hit("2")])), SearchOutcome::Stale);
        assert_eq!(visible_ids(&explorer).len(), 4);
    }

    #[test]
    fn test_search_failure_empties_visible() {
        let mut explorer = explorer();
        let ticket = explorer.set_query("cat").unwrap();
        let outcome = explorer.apply_search(ticket.seq, Err(Error::SearchFailed("boom".into())));
        assert_eq!(outcome, SearchOutcome::Failed);
        assert!(explorer.visible().is_empty());
        assert!(!explorer.is_searching());
        assert!(explorer.last_error().is_some());
    }

    #[test]
    fn test_index_unavailable_falls_back_to_store() {
        let mut explorer = explorer();
        explorer.set_category("cat");
        let ticket = explorer.set_query("cat").unwrap();
        let outcome = explorer.apply_search(ticket.seq, Err(Error::IndexUnavailable));
        assert_eq!(outcome, SearchOutcome::FellBack);
        assert_eq!(visible_ids(&explorer), vec!["1", "3"]);
        assert!(explorer.last_error().is_none());
    }

    #[test]
    fn test_category_reapplies_to_last_hits() {
        let mut explorer = explorer();
        let ticket = explorer.set_query("animal").unwrap();
        explorer.apply_search(ticket.seq, Ok(vec![hit("2"), hit("1"), hit("3")]));
        explorer.set_category("cat");
        assert_eq!(visible_ids(&explorer), vec!["1", "3"]);
    }

    #[test]
    fn test_unknown_hit_ids_are_ignored() {
        let mut explorer = explorer();
        let ticket = explorer.set_query("x").unwrap();
        explorer.apply_search(ticket.seq, Ok(vec![hit("zzz"), hit("4"), hit("4")]));
        assert_eq!(visible_ids(&explorer), vec!["4"]);
    }

    #[test]
    fn test_toggle_does_not_change_visible() {
        let mut explorer = explorer();
        let version = explorer.visible().version();
        assert_eq!(explorer.toggle_selection("2"), Some(true));
        assert_eq!(explorer.visible().version(), version);
        assert_eq!(explorer.selected_ids(), &["2"]);
        assert_eq!(explorer.toggle_selection("nope"), None);
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut explorer = explorer();
        explorer.toggle_selection("3");
        explorer.toggle_selection("1");
        let before = explorer.selected_ids().to_vec();
        explorer.toggle_selection("2");
        explorer.toggle_selection("2");
        assert_eq!(explorer.selected_ids(), before.as_slice());
    }

    #[test]
    fn test_show_selected_only() {
        let mut explorer = explorer();
        explorer.toggle_selection("3");
        explorer.toggle_selection("1");
        explorer.set_show_selected_only(true);
        // 表示順はグリッド順
        assert_eq!(visible_ids(&explorer), vec!["1", "3"]);

        explorer.toggle_selection("1");
        assert_eq!(visible_ids(&explorer), vec!["3"]);

        explorer.set_show_selected_only(false);
        assert_eq!(visible_ids(&explorer).len(), 4);
    }

    #[test]
    fn test_select_all_visible_then_reset() {
        let mut explorer = explorer();
        explorer.toggle_selection("4");
        explorer.set_category("cat");
        explorer.toggle_selection("3");
        let added = explorer.select_all_visible();
        assert_eq!(added, 1);
        assert_eq!(explorer.selected_ids(), &["4", "3", "1"]);

        explorer.move_focus(NavKey::End, 3);
        assert_eq!(explorer.focused_index(), Some(1));
        explorer.reset_selection();
        assert!(explorer.selected_ids().is_empty());
        assert_eq!(explorer.focused_index(), None);
    }

    #[test]
    fn test_focus_reset_when_visible_shrinks() {
        let mut explorer = explorer();
        explorer.focus(3);
        explorer.set_category("dog");
        assert_eq!(explorer.focused_index(), None);
    }

    #[test]
    fn test_focus_kept_when_still_in_range() {
        let mut explorer = explorer();
        explorer.focus(0);
        explorer.set_category("cat");
        assert_eq!(explorer.focused_index(), Some(0));
    }

    #[test]
    fn test_focus_rejects_out_of_range() {
        let mut explorer = explorer();
        assert!(!explorer.focus(4));
        assert_eq!(explorer.focused_index(), None);
    }

    #[test]
    fn test_move_focus_on_empty_visible() {
        let mut explorer = explorer();
        explorer.set_category("none");
        assert_eq!(explorer.move_focus(NavKey::Right, 3), None);
    }

    #[test]
    fn test_activate_focused_toggles() {
        let mut explorer = explorer();
        // 未フォーカスからの右移動で2番目のセルへ
        assert_eq!(explorer.move_focus(NavKey::Right, 2), Some(1));
        assert_eq!(explorer.activate_focused(), Some(true));
        assert_eq!(explorer.selected_ids(), &["2"]);
    }

    #[test]
    fn test_grid_cells() {
        let mut explorer = explorer();
        explorer.toggle_selection("2");
        let cells = explorer.grid_cells();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].tab_index, 0);
        assert!(cells[1].aria_selected);
        assert!(!cells[0].aria_selected);

        explorer.focus(2);
        let cells = explorer.grid_cells();
        assert_eq!(cells[0].tab_index, -1);
        assert_eq!(cells[2].tab_index, 0);
        assert!(cells[2].focused);
    }

    #[test]
    fn test_with_selection_drops_unknown_ids() {
        let explorer = explorer().with_selection(["3", "gone", "1"]);
        assert_eq!(explorer.selected_ids(), &["3", "1"]);
        let names: Vec<String> = explorer.selected_records().into_iter().map(|r| r.filename).collect();
        assert_eq!(names, vec!["cat2.png", "meow1.png"]);
    }

    #[test]
    fn test_events() {
        let mut explorer = explorer();
        explorer.toggle_selection("1");
        explorer.set_category("cat");
        let events = explorer.drain_events();
        assert!(matches!(
            events.first(),
            Some(ExplorerEvent::SelectionChanged { ids }) if ids == &["1"]
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, ExplorerEvent::VisibleSetChanged { len: 2, .. })));
        assert!(explorer.drain_events().is_empty());
    }

    #[test]
    fn test_visible_invariants_across_filters() {
        let mut explorer = explorer();
        explorer.toggle_selection("1");
        explorer.toggle_selection("2");
        for category in ["all", "cat", "dog", "cute", "none"] {
            for only in [false, true] {
                explorer.set_category(category);
                explorer.set_show_selected_only(only);
                let visible = explorer.visible();
                for r in visible.records() {
                    assert!(explorer.record(&r.id).is_some());
                    assert!(r.matches_category(category));
                    if only {
                        assert!(explorer.is_selected(&r.id));
                    }
                }
                if let Some(f) = explorer.focused_index() {
                    assert!(f < visible.len());
                }
            }
        }
    }
}
