//! 进程级处理状态
//!
//! 两个标记只用于拒绝重入（第二次触发批处理、重叠的下载），不会排队等待。

use std::sync::atomic::{AtomicBool, Ordering};

/// 处理状态
#[derive(Debug, Default)]
pub struct ProcessingState {
    processing: AtomicBool,
    downloading: AtomicBool,
}

impl ProcessingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading.load(Ordering::SeqCst)
    }

    /// 尝试开始批处理；已在处理中时返回 `None`
    pub fn try_begin_processing(&self) -> Option<FlagGuard<'_>> {
        FlagGuard::acquire(&self.processing)
    }

    /// 尝试开始下载；已在下载中时返回 `None`
    pub fn try_begin_download(&self) -> Option<FlagGuard<'_>> {
        FlagGuard::acquire(&self.downloading)
    }
}

/// 持有期间标记为真，释放（包括出错提前返回）时复位
#[derive(Debug)]
pub struct FlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
