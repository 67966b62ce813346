//! 対話セッション
//!
//! `Explorer` を所有し、検索を非同期に流して応答をチャネルで受け取る。
//! 選択が変わるたびに永続化し、エクスポート結果はステータスとして一定時間表示する。

use crate::config::Config;
use crate::error::{ExplorerError, Result};
use crate::export::{self, AssetSource, TextSink, ZipReport};
use emoji_explorer_common::{
    AssetRecord, Error as CoreError, ExplorerEvent, Explorer, ExportFormat, NavKey, RankedHit,
    SearchOutcome, SearchService, SelectionStore, StatusMessage, VisibleSet,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// セッションの調整値
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub search_timeout: Duration,
    pub status_clear: Duration,
    pub error_status_clear: Duration,
    pub grid_columns: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_timeout: config.search_timeout(),
            status_clear: config.status_clear(),
            error_status_clear: config.error_status_clear(),
            grid_columns: config.grid_columns,
        }
    }
}

/// 検索ワーカーからの応答
#[derive(Debug)]
pub struct SearchReply {
    pub seq: u64,
    pub result: emoji_explorer_common::Result<Vec<RankedHit>>,
}

/// 一定時間で消えるステータス表示
#[derive(Debug)]
pub struct StatusBoard {
    current: Option<(StatusMessage, Instant)>,
    success_ttl: Duration,
    failure_ttl: Duration,
}

impl StatusBoard {
    pub fn new(success_ttl: Duration, failure_ttl: Duration) -> Self {
        Self {
            current: None,
            success_ttl,
            failure_ttl,
        }
    }

    /// 表示を置き換える
    pub fn post(&mut self, message: StatusMessage) {
        self.current = Some((message, Instant::now()));
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current_at(Instant::now())
    }

    /// 指定時刻に表示されているメッセージ
    pub fn current_at(&self, now: Instant) -> Option<&StatusMessage> {
        let (message, posted) = self.current.as_ref()?;
        match message.clear_after(self.success_ttl, self.failure_ttl) {
            Some(ttl) if now.saturating_duration_since(*posted) >= ttl => None,
            _ => Some(message),
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// 検索・選択・エクスポートを束ねるセッション
pub struct Session {
    explorer: Explorer,
    search: Arc<dyn SearchService>,
    store: Box<dyn SelectionStore>,
    options: SessionOptions,
    tx: mpsc::UnboundedSender<SearchReply>,
    rx: mpsc::UnboundedReceiver<SearchReply>,
    status: StatusBoard,
    events: Vec<ExplorerEvent>,
}

impl Session {
    /// 保存済みの選択を読み込んで開始（ストアに無いIDは捨てる）
    pub fn new(
        records: Vec<AssetRecord>,
        search: Arc<dyn SearchService>,
        store: Box<dyn SelectionStore>,
        options: SessionOptions,
    ) -> Self {
        let persisted = store.load();
        let explorer = Explorer::new(records).with_selection(persisted);
        let (tx, rx) = mpsc::unbounded_channel();
        let status = StatusBoard::new(options.status_clear, options.error_status_clear);
        tracing::debug!(
            records = explorer.records().len(),
            selected = explorer.selected_ids().len(),
            "session started"
        );

        Self {
            explorer,
            search,
            store,
            options,
            tx,
            rx,
            status,
            events: Vec::new(),
        }
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn visible(&self) -> Arc<VisibleSet> {
        self.explorer.visible()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.current()
    }

    pub fn status_board(&self) -> &StatusBoard {
        &self.status
    }

    /// 処理済みイベントを取り出す
    pub fn drain_events(&mut self) -> Vec<ExplorerEvent> {
        std::mem::take(&mut self.events)
    }

    /// クエリ変更。検索を発行した場合はチケット番号を返す
    ///
    /// tokio ランタイム上で呼ぶこと。
    pub fn set_query(&mut self, text: &str) -> Option<u64> {
        let ticket = self.explorer.set_query(text);
        self.process_events();
        let ticket = ticket?;

        let service = Arc::clone(&self.search);
        let tx = self.tx.clone();
        let timeout = self.options.search_timeout;
        let seq = ticket.seq;
        let query = ticket.query;

        tokio::spawn(async move {
            let task = tokio::task::spawn_blocking(move || service.search(&query));
            let result = match tokio::time::timeout(timeout, task).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(CoreError::SearchFailed(e.to_string())),
                Err(_) => Err(CoreError::SearchTimeout(timeout.as_millis() as u64)),
            };
            // セッションが先に終了していれば捨てる
            let _ = tx.send(SearchReply { seq, result });
        });

        Some(seq)
    }

    /// 届いている応答をすべて適用
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(reply) = self.rx.try_recv() {
            self.apply_reply(reply);
            applied += 1;
        }
        applied
    }

    /// 次の応答を待って適用
    pub async fn next_reply(&mut self) -> Option<SearchOutcome> {
        let reply = self.rx.recv().await?;
        Some(self.apply_reply(reply))
    }

    /// 最新の検索が反映されるまで待つ
    pub async fn settle(&mut self) {
        while self.explorer.is_searching() {
            if self.next_reply().await.is_none() {
                break;
            }
        }
    }

    fn apply_reply(&mut self, reply: SearchReply) -> SearchOutcome {
        let outcome = self.explorer.apply_search(reply.seq, reply.result);
        tracing::debug!(seq = reply.seq, ?outcome, "search reply");
        self.process_events();
        outcome
    }

    pub fn set_category(&mut self, category: &str) {
        self.explorer.set_category(category);
        self.process_events();
    }

    pub fn set_show_selected_only(&mut self, on: bool) {
        self.explorer.set_show_selected_only(on);
        self.process_events();
    }

    /// 選択反転。反転後に選択されているかを返す
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let selected = self
            .explorer
            .toggle_selection(id)
            .ok_or_else(|| ExplorerError::UnknownAsset(id.to_string()))?;
        self.process_events();
        Ok(selected)
    }

    pub fn select_all_visible(&mut self) -> usize {
        let added = self.explorer.select_all_visible();
        self.process_events();
        added
    }

    pub fn reset_selection(&mut self) {
        self.explorer.reset_selection();
        self.process_events();
    }

    pub fn move_focus(&mut self, key: NavKey) -> Option<usize> {
        let focused = self.explorer.move_focus(key, self.options.grid_columns);
        self.process_events();
        focused
    }

    /// Enter/Space 相当
    pub fn activate_focused(&mut self) -> Option<bool> {
        let toggled = self.explorer.activate_focused();
        self.process_events();
        toggled
    }

    /// 選択を文字列形式で出力し、結果をステータスに出す
    pub fn export_text(&mut self, format: ExportFormat, sink: TextSink<'_>) -> Result<()> {
        let records = self.explorer.selected_records();
        let result = export::export_text(format, &records, sink);
        if let Err(e) = &result {
            tracing::warn!("{} export failed: {}", format, e);
        }
        self.status.post(export::text_status(format, sink, &result));
        result
    }

    /// 選択画像をZIPにまとめる
    pub async fn export_zip(&mut self, source: &AssetSource) -> Result<ZipReport> {
        self.status.post(export::zip_progress_status());
        let records = self.explorer.selected_records();
        let result = export::build_zip(&records, source).await;
        if let Err(e) = &result {
            tracing::warn!("zip export failed: {}", e);
        }
        self.status.post(export::zip_status(&result));
        result
    }

    fn process_events(&mut self) {
        for event in self.explorer.drain_events() {
            match &event {
                ExplorerEvent::SelectionChanged { ids } => {
                    // 保存失敗はセッションを止めない
                    if let Err(e) = self.store.save(ids) {
                        tracing::warn!("選択の保存に失敗: {}", e);
                    }
                }
                ExplorerEvent::SearchFailed { seq, message } => {
                    tracing::warn!(seq, "search failed: {}", message);
                }
                other => tracing::trace!(?other, "explorer event"),
            }
            self.events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emoji_explorer_common::StatusKind;

    #[test]
    fn test_status_board_expiry() {
        let mut board = StatusBoard::new(Duration::from_millis(2000), Duration::from_millis(3000));
        board.post(StatusMessage::success("ok"));
        let posted = Instant::now();
        assert!(board.current_at(posted).is_some());
        assert!(board.current_at(posted + Duration::from_millis(2500)).is_none());

        board.post(StatusMessage::failure("ng"));
        let posted = Instant::now();
        let shown = board.current_at(posted + Duration::from_millis(2500));
        assert_eq!(shown.map(|m| m.kind), Some(StatusKind::Failure), "失敗は3秒表示");
        assert!(board.current_at(posted + Duration::from_millis(3100)).is_none());
    }

    #[test]
    fn test_progress_stays_until_replaced() {
        let mut board = StatusBoard::new(Duration::from_millis(1), Duration::from_millis(1));
        board.post(StatusMessage::progress("ZIP準備中..."));
        let later = Instant::now() + Duration::from_secs(60);
        assert!(board.current_at(later).is_some());
        board.clear();
        assert!(board.current().is_none());
    }
}
