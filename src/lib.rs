//! # Auto Video Gen
//!
//! 在 AI 视频生成网页上批量"上传图片 → 生成 → 下载视频"的自动化工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `HostPage` - 宿主页面能力接口（查询、写值、点击、上传、观察变化）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心批次
//! - `wait` - 元素等待、条件等待、人类化点击、随机延迟
//! - `LicenseGuard` - 离线许可校验与使用时长统计
//! - `KvStore` / `CredentialVerifier` / `Operator` / `Notifier` - 存储、验签、操作者、通知
//! - `FailureWriter` - 写 failed.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整处理流程
//! - `FileCtx` / `BatchCtx` - 文件上下文与批次上下文（提示词、首次运行）
//! - `FileFlow` - 流程编排（上传 → 提示词 → 确认 → 发送 → 限流重试 → 等待封面 → 下载）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文件处理器，重入保护与顺序处理
//! - `orchestrator/app` - 应用生命周期，许可校验与会话提交
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppResult, AutomationError, LicenseError, LockReason};
pub use infrastructure::{CdpPage, HostPage, JsExecutor};
pub use models::{load_image_batch, Selectors, Timings};
pub use orchestrator::{App, BatchProcessor, BatchReport};
pub use services::LicenseGuard;
pub use workflow::{BatchCtx, FileCtx, FileFlow, FileResult, ProcessingState};
