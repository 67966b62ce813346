//! グリッド上のキーボードフォーカス移動

use serde::{Deserialize, Serialize};

/// ナビゲーションキー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

impl std::str::FromStr for NavKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ArrowUp" | "up" | "k" => Ok(NavKey::Up),
            "ArrowDown" | "down" | "j" => Ok(NavKey::Down),
            "ArrowLeft" | "left" | "h" => Ok(NavKey::Left),
            "ArrowRight" | "right" | "l" => Ok(NavKey::Right),
            "Home" | "home" => Ok(NavKey::Home),
            "End" | "end" => Ok(NavKey::End),
            _ => Err(format!("Unknown key: {}", s)),
        }
    }
}

/// 次のフォーカス位置
///
/// 範囲外への移動は折り返さず端で止める。
/// 未フォーカス時はタブストップ（先頭セル）から移動する。
pub fn next_focus(current: Option<usize>, key: NavKey, cols: usize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    let cols = cols.max(1);
    let from = current.unwrap_or(0);

    let next = match key {
        NavKey::Home => 0,
        NavKey::End => last,
        NavKey::Right => from.saturating_add(1),
        NavKey::Left => from.saturating_sub(1),
        NavKey::Down => from.saturating_add(cols),
        NavKey::Up => from.saturating_sub(cols),
    };
    Some(next.min(last))
}
