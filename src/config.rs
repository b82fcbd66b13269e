use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{Selectors, Timings};

/// 默认配置文件路径，可通过 `AUTO_VIDEO_CONFIG` 覆盖
pub const DEFAULT_CONFIG_FILE: &str = "auto_video.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标页面 URL（为空时使用浏览器中已打开的页面）
    pub target_url: Option<String>,
    /// 目标页面标题关键字
    pub target_title: Option<String>,
    /// 是否启动无头浏览器而不是连接已有浏览器
    pub headless: bool,
    /// 无头模式下的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 待处理图片所在目录
    pub image_folder: String,
    /// 许可状态存储文件
    pub store_path: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 失败文件记录
    pub failed_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 页面选择器
    pub selectors: Selectors,
    /// 时间参数
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: None,
            target_title: None,
            headless: false,
            chrome_executable: None,
            image_folder: "images".to_string(),
            store_path: "license_store.json".to_string(),
            output_log_file: "output.txt".to_string(),
            failed_log_file: "failed.txt".to_string(),
            verbose_logging: false,
            selectors: Selectors::default(),
            timings: Timings::default(),
        }
    }
}

impl Config {
    /// 加载配置：先读取 TOML 配置文件（可选），再应用环境变量
    pub fn load() -> Result<Self> {
        let path = std::env::var("AUTO_VIDEO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        Ok(base.with_env())
    }

    /// 从 TOML 文件读取配置，缺失字段使用默认值
    pub fn from_toml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("无法读取配置文件: {}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("无法解析配置文件: {}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env(self) -> Self {
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(self.browser_debug_port),
            target_url: std::env::var("TARGET_URL").ok().or(self.target_url),
            target_title: std::env::var("TARGET_TITLE").ok().or(self.target_title),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            image_folder: std::env::var("IMAGE_FOLDER").unwrap_or(self.image_folder),
            store_path: std::env::var("STORE_PATH").unwrap_or(self.store_path),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            failed_log_file: std::env::var("FAILED_LOG_FILE").unwrap_or(self.failed_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            selectors: self.selectors,
            timings: self.timings,
        }
    }
}
