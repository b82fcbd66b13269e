//! 操作者交互 - 业务能力层
//!
//! 模态输入和模态提示都视为流程中的挂起点。

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

/// 需要操作者输入的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// 许可码
    LicenseCode,
    /// 视频描述（整批复用）
    PromptText,
}

impl InputKind {
    /// 展示给操作者的提示语
    pub fn message(self) -> &'static str {
        match self {
            InputKind::LicenseCode => "请输入脚本使用许可码:",
            InputKind::PromptText => "请输入视频描述（后续自动复用）：",
        }
    }
}

/// 操作者
#[async_trait]
pub trait Operator: Send + Sync {
    /// 请求输入；操作者取消或输入为空时返回 `None`
    async fn request_input(&self, kind: InputKind) -> Option<String>;

    /// 向操作者展示一条需要确认的消息
    async fn alert(&self, message: &str);
}

/// 读取标准输入、写入标准错误的终端操作者
pub struct ConsoleOperator {
    reader: Mutex<BufReader<Stdin>>,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    async fn request_input(&self, kind: InputKind) -> Option<String> {
        let mut stderr = tokio::io::stderr();
        if stderr.write_all(format!("{} ", kind.message()).as_bytes()).await.is_err() {
            return None;
        }
        let _ = stderr.flush().await;

        let mut line = String::new();
        let mut reader = self.reader.lock().await;
        match reader.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => normalize_input(&line),
            Err(e) => {
                warn!("读取输入失败: {}", e);
                None
            }
        }
    }

    async fn alert(&self, message: &str) {
        let mut stderr = tokio::io::stderr();
        let _ = stderr.write_all(format!("{}\n", message).as_bytes()).await;
        let _ = stderr.flush().await;
    }
}

/// 去掉行尾换行；全空白视为未输入
pub fn normalize_input(raw: &str) -> Option<String> {
    let value = raw.trim_end_matches(&['\r', '\n'][..]);
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
