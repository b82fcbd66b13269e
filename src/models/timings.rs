//! 流程中的延时、超时与重试上限

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 以毫秒表示的随机延时区间 `[min_ms, max_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitterRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl JitterRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// 在区间内均匀采样一个时长
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::rng().random_range(self.min_ms..self.max_ms);
        Duration::from_millis(ms)
    }
}

/// 各步骤的时间参数（毫秒）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// 查找元素的轮询间隔
    pub poll_interval_ms: u64,
    /// 查找元素的默认超时
    pub element_timeout_ms: u64,
    /// 上传图片后的等待
    pub upload_settle_ms: u64,
    /// 写入提示词后的等待
    pub prompt_settle_ms: u64,
    /// 点击确认上传后的等待
    pub confirm_settle_ms: u64,
    /// 点击发送后的随机等待
    pub send_jitter: JitterRange,
    /// 每轮限流检测前的等待
    pub throttle_check_ms: u64,
    /// 检测到限流后的冷却时间
    pub throttle_cooldown_ms: u64,
    /// 限流重试上限
    pub max_throttle_retries: usize,
    /// 等待封面生成的超时
    pub completion_timeout_ms: u64,
    /// 等待下载按钮的超时
    pub download_timeout_ms: u64,
    /// 点击下载后等待浏览器开始下载
    pub post_download_wait_ms: u64,
    /// 模拟点击时事件之间的随机间隔
    pub click_jitter: JitterRange,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            element_timeout_ms: 15_000,
            upload_settle_ms: 800,
            prompt_settle_ms: 500,
            confirm_settle_ms: 800,
            send_jitter: JitterRange::new(500, 1500),
            throttle_check_ms: 7_000,
            throttle_cooldown_ms: 600_000,
            max_throttle_retries: 5,
            completion_timeout_ms: 1_200_000,
            download_timeout_ms: 60_000,
            post_download_wait_ms: 3_000,
            click_jitter: JitterRange::new(80, 200),
        }
    }
}

impl Timings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn upload_settle(&self) -> Duration {
        Duration::from_millis(self.upload_settle_ms)
    }

    pub fn prompt_settle(&self) -> Duration {
        Duration::from_millis(self.prompt_settle_ms)
    }

    pub fn confirm_settle(&self) -> Duration {
        Duration::from_millis(self.confirm_settle_ms)
    }

    pub fn throttle_check(&self) -> Duration {
        Duration::from_millis(self.throttle_check_ms)
    }

    pub fn throttle_cooldown(&self) -> Duration {
        Duration::from_millis(self.throttle_cooldown_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }

    pub fn post_download_wait(&self) -> Duration {
        Duration::from_millis(self.post_download_wait_ms)
    }
}
