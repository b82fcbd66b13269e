//! 应用生命周期 - 编排层
//!
//! 1. 连接浏览器并取得宿主页面
//! 2. 启动时校验许可（失败则终止，不进入批处理）
//! 3. 加载图片并执行批处理；Ctrl-C 会提前结束批处理
//! 4. 退出前提交本次会话的使用时长

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{debug, error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{CdpPage, HostPage, JsExecutor};
use crate::models::load_image_batch;
use crate::orchestrator::batch_processor::{BatchProcessor, BatchReport};
use crate::services::{
    ConsoleOperator, FailureWriter, HmacVerifier, JsonFileStore, LicenseGuard, LogNotifier,
    Notifier, Operator, SystemClock,
};
use crate::utils::logging;
use crate::workflow::{FileFlow, ProcessingState};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    page: Arc<CdpPage>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let (browser, page) = if config.headless {
            let url = config
                .target_url
                .as_deref()
                .context("无头模式需要设置 TARGET_URL")?;
            browser::launch_headless_browser(url, config.chrome_executable.as_deref()).await?
        } else {
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                config.target_url.as_deref(),
                config.target_title.as_deref(),
            )
            .await?
        };

        let page = Arc::new(CdpPage::new(JsExecutor::new(page)));

        Ok(Self {
            config,
            _browser: browser,
            page,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let operator: Arc<dyn Operator> = Arc::new(ConsoleOperator::new());
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

        let store = JsonFileStore::open(&self.config.store_path)
            .await
            .with_context(|| format!("无法打开许可存储: {}", self.config.store_path))?;
        debug!("许可存储: {}", store.path().display());
        let guard = LicenseGuard::new(
            Arc::new(store),
            operator.clone(),
            Arc::new(HmacVerifier::embedded()?),
            Arc::new(SystemClock),
        );

        let session = match guard.check().await {
            Ok(session) => session,
            Err(e) if e.is_license() => {
                error!("❌ 许可校验未通过: {}", e);
                return Err(e.into());
            }
            Err(e) => {
                error!("❌ 读取许可状态失败: {}", e);
                return Err(e.into());
            }
        };

        let outcome = self.process(operator, notifier).await;

        // 无论批处理结果如何都要提交使用时长
        match guard.commit_session(session).await {
            Ok(usage) if usage.locked => warn!("⏰ 许可已锁定，下次启动将无法使用"),
            Ok(_) => {}
            Err(e) => error!("❌ 提交使用时长失败: {}", e),
        }

        if let Some(report) = outcome? {
            logging::print_final_stats(&report, &self.config.output_log_file);
        }

        Ok(())
    }

    /// 加载图片并执行一批处理，Ctrl-C 会在当前文件处中断批处理
    async fn process(
        &self,
        operator: Arc<dyn Operator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Option<BatchReport>> {
        info!("\n📁 正在扫描待处理的图片...");
        let files: Vec<PathBuf> = load_image_batch(&self.config.image_folder).await?;

        if files.is_empty() {
            warn!("⚠️ 没有找到待处理的图片，程序结束");
            return Ok(None);
        }

        let flow = FileFlow::new(
            self.config.selectors.clone(),
            self.config.timings.clone(),
            operator,
            notifier.clone(),
        );
        let page: Arc<dyn HostPage> = self.page.clone();
        let processor = BatchProcessor::new(
            page,
            flow,
            Arc::new(ProcessingState::new()),
            notifier,
            FailureWriter::with_path(&self.config.failed_log_file),
        );

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // 无法监听中断信号时不中断批处理
                warn!("⚠️ 监听中断信号失败: {}", e);
                std::future::pending::<()>().await;
            }
        };

        Ok(processor.process_files_until(&files, shutdown).await)
    }
}
