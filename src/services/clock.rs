//! 时钟抽象，便于在测试中控制时间

/// 墙上时钟
pub trait Clock: Send + Sync {
    /// 当前 Unix 时间戳（毫秒）
    fn now_millis(&self) -> i64;

    /// 当前 Unix 时间戳（秒）
    fn now_secs(&self) -> i64 {
        self.now_millis().div_euclid(1000)
    }
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
