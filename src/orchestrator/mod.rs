//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用生命周期
//! - 连接浏览器，持有 Browser 和宿主页面
//! - 启动时校验许可，退出时提交使用时长
//! - 加载图片批次，输出最终统计
//!
//! ### `batch_processor` - 批量文件处理器
//! - 重入保护，重复触发直接忽略
//! - 严格按顺序处理每个文件
//! - 安装/移除离开页面确认，发送完成通知
//!
//! ## 层次关系
//!
//! ```text
//! app (许可 + 生命周期)
//!     ↓
//! batch_processor (处理 Vec<PathBuf>)
//!     ↓
//! workflow::FileFlow (处理单个文件)
//!     ↓
//! services (能力层：wait / license / store / operator / notifier)
//!     ↓
//! infrastructure (基础设施：HostPage / JsExecutor)
//! ```

pub mod app;
pub mod batch_processor;

pub use app::App;
pub use batch_processor::{BatchProcessor, BatchReport, UNLOAD_MESSAGE};
