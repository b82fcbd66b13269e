//! 单文件处理流程 - 流程层
//!
//! 核心职责：定义"一张图片"的完整处理流程
//!
//! 流程顺序：
//! 1. 上传图片
//! 2. 填写提示词（整批复用）
//! 3. 确认上传
//! 4. 点击发送
//! 5. 限流重试（首个文件跳过）
//! 6. 等待封面生成
//! 7. 下载

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{AppResult, AutomationError};
use crate::infrastructure::{HostPage, MouseEventKind};
use crate::models::{Selectors, Timings};
use crate::services::notifier::{Notice, Notifier};
use crate::services::operator::{InputKind, Operator};
use crate::services::wait::{random_delay, simulate_interaction, wait_for_element, wait_for_selector_mutation};
use crate::utils::logging::truncate_text;
use crate::workflow::file_ctx::{BatchCtx, FileCtx};
use crate::workflow::state::ProcessingState;

/// 失败通知的展示时长
const FAILURE_NOTICE_DURATION: Duration = Duration::from_secs(3);

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    /// 已触发下载
    Completed,
    /// 处理失败（附失败原因）
    Failed(String),
}

/// 下载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// 已点击下载按钮
    Started,
    /// 已有下载在进行，本次调用被忽略
    AlreadyInProgress,
}

/// 单文件处理流程
///
/// - 编排一张图片从上传到下载的全部步骤
/// - 不持有页面资源，由调用方传入
/// - 任何一步出错只中止当前文件
pub struct FileFlow {
    selectors: Selectors,
    timings: Timings,
    operator: Arc<dyn Operator>,
    notifier: Arc<dyn Notifier>,
}

impl FileFlow {
    /// 创建新的文件处理流程
    pub fn new(
        selectors: Selectors,
        timings: Timings,
        operator: Arc<dyn Operator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            selectors,
            timings,
            operator,
            notifier,
        }
    }

    /// 处理单个文件，错误在此处被捕获并转换为 `FileResult::Failed`
    pub async fn process_file(
        &self,
        page: &dyn HostPage,
        ctx: &FileCtx,
        batch: &mut BatchCtx,
        state: &ProcessingState,
    ) -> FileResult {
        info!("\n{} ▶️ 开始处理", ctx);

        match self.run(page, ctx, batch, state).await {
            Ok(()) => {
                info!("{} ✅ 处理完成", ctx);
                FileResult::Completed
            }
            Err(e) => {
                error!("{} ❌ 处理失败: {}", ctx, e);
                self.notifier
                    .notify(Notice::new("处理失败", ctx.name.clone(), FAILURE_NOTICE_DURATION));
                FileResult::Failed(e.to_string())
            }
        }
    }

    /// 按顺序执行全部步骤
    pub async fn run(
        &self,
        page: &dyn HostPage,
        ctx: &FileCtx,
        batch: &mut BatchCtx,
        state: &ProcessingState,
    ) -> AppResult<()> {
        self.upload(page, ctx).await?;

        self.handle_prompt(page, batch).await?;

        self.confirm_upload(page).await?;

        self.trigger_send_button(page).await?;

        // 首个文件不等待，后续文件进入限流重试
        if !batch.first_run {
            self.throttle_retry(page, ctx).await?;
        }
        batch.first_run = false;

        self.wait_for_completion(page).await?;
        info!("{} ✅ 封面已生成", ctx);

        self.download_video(page, state).await?;

        Ok(())
    }

    /// 上传图片
    async fn upload(&self, page: &dyn HostPage, ctx: &FileCtx) -> AppResult<()> {
        let selector = &self.selectors.file_input;
        wait_for_element(page, selector, self.timings.element_timeout(), self.timings.poll_interval()).await?;
        page.attach_file(selector, &ctx.path).await?;
        debug!("{} 已选择文件", ctx);
        sleep(self.timings.upload_settle()).await;
        Ok(())
    }

    /// 填写提示词
    ///
    /// 本批第一次确定的提示词（输入框已有内容或操作者输入）会被后续文件直接复用
    pub async fn handle_prompt(&self, page: &dyn HostPage, batch: &mut BatchCtx) -> AppResult<()> {
        let selector = &self.selectors.prompt;
        wait_for_element(page, selector, self.timings.element_timeout(), self.timings.poll_interval()).await?;

        let current = page.read_value(selector).await?.unwrap_or_default();

        let prompt = match &batch.prompt_text {
            Some(text) => text.clone(),
            None => {
                let text = if !current.trim().is_empty() {
                    info!("📝 使用输入框中已有的提示词");
                    current.clone()
                } else {
                    self.operator
                        .request_input(InputKind::PromptText)
                        .await
                        .ok_or(AutomationError::MissingPrompt)?
                };
                batch.prompt_text = Some(text.clone());
                text
            }
        };

        debug!("提示词: {}", truncate_text(&prompt, 30));
        if current != prompt {
            page.write_value(selector, &prompt).await?;
            sleep(self.timings.prompt_settle()).await;
        }

        Ok(())
    }

    /// 确认上传
    async fn confirm_upload(&self, page: &dyn HostPage) -> AppResult<()> {
        let selector = &self.selectors.confirm;
        wait_for_element(page, selector, self.timings.element_timeout(), self.timings.poll_interval()).await?;
        page.click(selector).await?;
        info!("✅ 确认上传图片");
        sleep(self.timings.confirm_settle()).await;
        Ok(())
    }

    /// 点击发送按钮，随后随机等待
    pub async fn trigger_send_button(&self, page: &dyn HostPage) -> AppResult<()> {
        let selector = &self.selectors.send;
        if !page.exists(selector).await? {
            return Err(AutomationError::SendButtonNotFound {
                selector: selector.clone(),
            });
        }
        page.dispatch_mouse(selector, MouseEventKind::Click).await?;
        info!("✅ 点击发送");
        random_delay(self.timings.send_jitter).await;
        Ok(())
    }

    /// 限流重试
    ///
    /// 每轮等待后检查"歇一歇"提示：出现则冷却后重新发送，未出现则立即结束。
    /// 用完重试次数只记录警告，流程照常继续。返回重新发送的次数。
    pub async fn throttle_retry(&self, page: &dyn HostPage, ctx: &FileCtx) -> AppResult<usize> {
        let max_retries = self.timings.max_throttle_retries;
        let cooldown = self.timings.throttle_cooldown();
        let mut retries = 0;

        while retries < max_retries {
            sleep(self.timings.throttle_check()).await;

            if page.exists(&self.selectors.throttle).await? {
                warn!(
                    "{} ⚠️ 第 {} 次检测到歇一歇，暂停 {} 分钟后重试上传",
                    ctx,
                    retries + 1,
                    cooldown.as_secs() / 60
                );
                sleep(cooldown).await;
                info!("{} 🔄 重试点击发送按钮", ctx);
                self.trigger_send_button(page).await?;
                retries += 1;
            } else {
                info!("{} ✅ 未检测到歇一歇，继续后续流程", ctx);
                break;
            }
        }

        if max_retries > 0 && retries == max_retries {
            warn!("{} ⚠️ 已达到最大重试次数 {} 次，跳过重试", ctx, max_retries);
        }

        Ok(retries)
    }

    /// 等待封面生成
    async fn wait_for_completion(&self, page: &dyn HostPage) -> AppResult<()> {
        wait_for_selector_mutation(
            page,
            "封面",
            &self.selectors.cover,
            self.timings.completion_timeout(),
        )
        .await
    }

    /// 下载视频
    ///
    /// 已在下载中时直接返回，不触碰页面；下载标记在任何路径上都会释放
    pub async fn download_video(
        &self,
        page: &dyn HostPage,
        state: &ProcessingState,
    ) -> AppResult<DownloadOutcome> {
        let Some(_downloading) = state.try_begin_download() else {
            warn!("⚠️ 已在下载中，跳过重复下载");
            return Ok(DownloadOutcome::AlreadyInProgress);
        };

        match self.trigger_download(page).await {
            Ok(()) => Ok(DownloadOutcome::Started),
            Err(e) => {
                error!("❌ 下载失败: {}", e);
                self.notifier
                    .notify(Notice::new("下载失败", e.to_string(), FAILURE_NOTICE_DURATION));
                Err(e)
            }
        }
    }

    async fn trigger_download(&self, page: &dyn HostPage) -> AppResult<()> {
        let selector = &self.selectors.download;
        info!("🔍 开始查找下载按钮 {}", selector);
        wait_for_element(page, selector, self.timings.download_timeout(), self.timings.poll_interval()).await?;

        info!("✅ 找到下载按钮，模拟点击");
        simulate_interaction(page, selector, self.timings.click_jitter).await?;

        let wait = self.timings.post_download_wait();
        info!("⏳ 等待 {}s 确保下载启动", wait.as_secs());
        sleep(wait).await;
        info!("✅ 下载触发完毕");
        Ok(())
    }
}
