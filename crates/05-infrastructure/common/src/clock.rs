//! 时间源
//!
//! 重载检查以 Unix 秒为单位比较时间，时间源可注入以便测试。

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::SystemTime;

/// 时间源 trait
pub trait Clock: Send + Sync {
    /// 当前 Unix 时间（秒）
    fn now_secs(&self) -> i64;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// 手动时钟，时间只在显式设置或推进时变化
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// 创建指定起始时间的手动时钟
    pub fn new(start_secs: i64) -> Self {
        Self {
            now: AtomicI64::new(start_secs),
        }
    }

    /// 设置当前时间
    pub fn set(&self, secs: i64) {
        self.now.store(secs, Ordering::SeqCst);
    }

    /// 推进时间
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// 将文件时间转换为 Unix 秒（向下取整）
pub fn system_time_secs(time: SystemTime) -> i64 {
    chrono::DateTime::<chrono::Utc>::from(time).timestamp()
}
