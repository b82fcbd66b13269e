//! 文件处理上下文
//!
//! 封装"我正在处理本批第几张图片"以及整批共享的粘性状态

use std::fmt::Display;
use std::path::PathBuf;

/// 单个文件的处理上下文
#[derive(Debug, Clone)]
pub struct FileCtx {
    /// 文件在本批中的序号（从1开始）
    pub index: usize,

    /// 本批文件总数
    pub total: usize,

    /// 文件路径
    pub path: PathBuf,

    /// 文件名（用于日志和失败记录）
    pub name: String,
}

impl FileCtx {
    /// 创建新的文件上下文
    pub fn new(index: usize, total: usize, path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            index,
            total,
            path,
            name,
        }
    }
}

impl Display for FileCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {}/{} {}]", self.index, self.total, self.name)
    }
}

/// 一个批次内共享的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCtx {
    /// 本批复用的提示词，第一次确定后不再改变
    pub prompt_text: Option<String>,

    /// 是否尚未有文件完成发送步骤；为真时跳过限流重试
    pub first_run: bool,
}

impl BatchCtx {
    pub fn new() -> Self {
        Self {
            prompt_text: None,
            first_run: true,
        }
    }
}

impl Default for BatchCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_file_name() {
        let ctx = FileCtx::new(2, 5, PathBuf::from("/tmp/images/cat.png"));
        assert_eq!(ctx.to_string(), "[文件 2/5 cat.png]");
    }
}
