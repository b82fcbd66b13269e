//! 失败记录写入服务 - 业务能力层
//!
//! 只负责"写 failed.txt"能力，不关心流程

use anyhow::Result;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 失败记录写入服务
///
/// 批次结束后操作者可以据此找出需要重新处理的图片
pub struct FailureWriter {
    path: PathBuf,
}

impl FailureWriter {
    /// 使用默认路径 `failed.txt` 创建
    pub fn new() -> Self {
        Self::with_path("failed.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 追加一条失败记录
    ///
    /// # 参数
    /// - `file_name`: 失败的图片文件名
    /// - `reason`: 失败原因
    pub async fn write(&self, file_name: &str, reason: &str) -> Result<()> {
        debug!("写入失败记录: {} | {}", file_name, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let line = format!(
            "{} | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            file_name,
            reason
        );

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::new()
    }
}
