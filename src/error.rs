//! 错误类型
//!
//! 单文件流水线内的错误只会中止当前文件；许可相关错误则会终止整个运行。

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// 自动化流程错误
#[derive(Debug, Error)]
pub enum AutomationError {
    /// 超时后仍未找到必需的页面元素
    #[error("未找到元素: {selector}")]
    NotFound { selector: String },

    /// 有界等待超时（例如封面一直没有生成）
    #[error("等待{what}超时 ({}s)", .after.as_secs())]
    Timeout { what: String, after: Duration },

    /// 操作者拒绝输入提示词
    #[error("必须输入提示词")]
    MissingPrompt,

    /// 发送按钮不存在
    #[error("发送按钮未找到: {selector}")]
    SendButtonNotFound { selector: String },

    /// 许可校验失败（终止性错误）
    #[error(transparent)]
    License(#[from] LicenseError),

    /// 浏览器协议错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// 页面脚本返回了无法识别的结果
    #[error("执行脚本失败: {0}")]
    Script(String),

    /// JSON 序列化/反序列化失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 本地文件读写失败
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AutomationError {
    /// 创建元素未找到错误
    pub fn not_found(selector: impl Into<String>) -> Self {
        AutomationError::NotFound {
            selector: selector.into(),
        }
    }

    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        AutomationError::Timeout {
            what: what.into(),
            after,
        }
    }

    /// 是否为终止整个运行的许可错误
    pub fn is_license(&self) -> bool {
        matches!(self, AutomationError::License(_))
    }
}

/// 许可校验的终止性结果
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LicenseError {
    /// 操作者未输入许可码
    #[error("未输入许可码，脚本终止")]
    Rejected,

    /// 许可已锁定
    #[error("许可已锁定: {reason}")]
    Locked { reason: LockReason },
}

/// 锁定原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    /// 之前已被锁定
    PreviouslyLocked,
    /// 累计使用时长达到上限
    BudgetExhausted,
    /// 连续输入错误次数过多
    TooManyAttempts,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockReason::PreviouslyLocked => write!(f, "许可此前已被锁定"),
            LockReason::BudgetExhausted => write!(f, "累计使用时长已达上限"),
            LockReason::TooManyAttempts => write!(f, "连续多次输入无效许可码"),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AutomationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_contains_seconds() {
        let err = AutomationError::timeout("封面", Duration::from_secs(1200));
        assert_eq!(err.to_string(), "等待封面超时 (1200s)");
    }

    #[test]
    fn test_license_error_is_terminal() {
        let err: AutomationError = LicenseError::Locked {
            reason: LockReason::TooManyAttempts,
        }
        .into();
        assert!(err.is_license());
        assert!(!AutomationError::MissingPrompt.is_license());
    }
}
