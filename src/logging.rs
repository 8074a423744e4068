//! 日志初始化

use std::str::FromStr;

use tracing::Level;

use crate::env::{
    core::{LogLevel, Mode},
    EnvVar,
};

/// 按 `TWEET_TRANSLATOR_LOG_LEVEL` 初始化 fmt 订阅者，日志写到 stderr
///
/// 开发模式下额外输出模块路径。重复调用是无害的。
pub fn init_logging() {
    let level = match LogLevel::get() {
        Ok(level) => Level::from_str(&level).unwrap_or(Level::INFO),
        Err(e) => {
            eprintln!("{}，使用 info 级别", e);
            Level::INFO
        }
    };
    let development = Mode::get().map(|mode| mode == "development").unwrap_or(false);

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(development)
        .with_writer(std::io::stderr)
        .try_init();
}
