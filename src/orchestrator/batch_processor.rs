//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **重入保护**：已在处理中时忽略新的触发（不排队、不报错）
//! 2. **顺序处理**：严格按顺序逐个调用 `FileFlow`，绝不并发
//! 3. **离开确认**：处理期间安装页面离开确认
//! 4. **部分失败**：单个文件失败不影响后续文件，失败记录写入 failed.txt
//! 5. **完成通知**：批次结束后发出一条汇总通知
//! 6. **中断**：收到中断信号时停在当前文件，同样移除离开确认

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::infrastructure::HostPage;
use crate::services::failure_writer::FailureWriter;
use crate::services::notifier::{Notice, Notifier};
use crate::workflow::{BatchCtx, FileCtx, FileFlow, FileResult, ProcessingState};

/// 处理期间离开页面时的确认文案
pub const UNLOAD_MESSAGE: &str = "文件正在处理中…";

/// 批次处理结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub completed: usize,
    /// 失败的文件名
    pub failed: Vec<String>,
}

/// 批量文件处理器
pub struct BatchProcessor {
    page: Arc<dyn HostPage>,
    flow: FileFlow,
    state: Arc<ProcessingState>,
    notifier: Arc<dyn Notifier>,
    failure_writer: FailureWriter,
}

impl BatchProcessor {
    pub fn new(
        page: Arc<dyn HostPage>,
        flow: FileFlow,
        state: Arc<ProcessingState>,
        notifier: Arc<dyn Notifier>,
        failure_writer: FailureWriter,
    ) -> Self {
        Self {
            page,
            flow,
            state,
            notifier,
            failure_writer,
        }
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    /// 处理一批文件
    ///
    /// 已有批次在处理中时直接返回 `None`
    pub async fn process_files(&self, files: &[PathBuf]) -> Option<BatchReport> {
        self.process_files_until(files, std::future::pending()).await
    }

    /// 处理一批文件，`shutdown` 先完成时在当前文件处中断
    ///
    /// 无论正常结束还是中断，都会释放处理标记并移除离开确认；
    /// 中断时返回已完成部分的结果，不发送完成通知。
    pub async fn process_files_until<F>(&self, files: &[PathBuf], shutdown: F) -> Option<BatchReport>
    where
        F: Future<Output = ()>,
    {
        let Some(busy) = self.state.try_begin_processing() else {
            debug!("已有批次在处理中，忽略本次触发");
            return None;
        };

        let total = files.len();
        log_batch_start(total);

        if let Err(e) = self.page.set_unload_guard(Some(UNLOAD_MESSAGE)).await {
            warn!("⚠️ 安装离开确认失败: {}", e);
        }

        let mut report = BatchReport {
            total,
            ..Default::default()
        };

        let interrupted = tokio::select! {
            _ = self.run_files(files, &mut report) => false,
            _ = shutdown => true,
        };

        drop(busy);
        if let Err(e) = self.page.set_unload_guard(None).await {
            warn!("⚠️ 移除离开确认失败: {}", e);
        }

        if interrupted {
            warn!(
                "⚠️ 收到中断信号，停止处理（已完成 {}/{}）",
                report.completed, report.total
            );
        } else {
            self.notifier.notify(Notice::new(
                "处理完成",
                format!("共 {} 个文件已完成", total),
                Duration::from_secs(5),
            ));
        }
        log_batch_complete(&report);

        Some(report)
    }

    /// 严格按顺序处理每个文件
    async fn run_files(&self, files: &[PathBuf], report: &mut BatchReport) {
        let mut batch = BatchCtx::new();
        let total = files.len();

        for (idx, path) in files.iter().enumerate() {
            let ctx = FileCtx::new(idx + 1, total, path.clone());

            match self
                .flow
                .process_file(self.page.as_ref(), &ctx, &mut batch, &self.state)
                .await
            {
                FileResult::Completed => report.completed += 1,
                FileResult::Failed(reason) => {
                    if let Err(e) = self.failure_writer.write(&ctx.name, &reason).await {
                        warn!("{} ⚠️ 写入失败记录失败: {}", ctx, e);
                    }
                    report.failed.push(ctx.name.clone());
                }
            }
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_start(total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理本批图片，共 {} 个", total);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(report: &BatchReport) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 本批完成: 成功 {}/{}", report.completed, report.total);
    for name in &report.failed {
        info!("  ❌ {}", name);
    }
    info!("{}", "─".repeat(60));
}
