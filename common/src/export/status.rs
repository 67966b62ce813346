//! エクスポート結果のステータス表示

use std::time::Duration;

/// ステータス種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// 処理中（次のメッセージで置き換わるまで表示）
    Progress,
    Success,
    Failure,
}

/// 一定時間で消えるステータスメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn progress(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Progress,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Failure,
            text: text.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind == StatusKind::Failure
    }

    /// 自動で消えるまでの時間（Progress は消えない）
    pub fn clear_after(&self, success: Duration, failure: Duration) -> Option<Duration> {
        match self.kind {
            StatusKind::Progress => None,
            StatusKind::Success => Some(success),
            StatusKind::Failure => Some(failure),
        }
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
