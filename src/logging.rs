//! ログ初期化
//!
//! 進捗表示は stdout（println!）、診断ログは tracing で stderr に出す。

use tracing_subscriber::EnvFilter;

/// tracing を初期化（RUST_LOG があればそちらを優先）
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // テストなどで二重初期化されても無視する
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
