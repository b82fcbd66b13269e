//! 通知 - 业务能力层
//!
//! 通知是"发出即忘"的：不等待、不重试。

use std::time::Duration;

use tracing::info;

/// 一条短暂通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub text: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(title: impl Into<String>, text: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            duration,
        }
    }
}

/// 通知渠道
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// 写入日志的通知渠道
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        info!("🔔 {}: {}", notice.title, notice.text);
    }
}
