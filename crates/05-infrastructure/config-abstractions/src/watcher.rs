//! 文件变更检测抽象
//!
//! 不使用后台定时器：每次读取配置时比较当前时间与下一次检查时间，
//! 到期后才去获取文件的修改时间。

use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, trace};

/// 将检查间隔转换为可参与时间运算的秒数
pub fn interval_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// 重载检查时间表
///
/// `next_check = last_check + interval`，只在加载成功时整体重置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadSchedule {
    last_check: i64,
    next_check: i64,
}

impl ReloadSchedule {
    /// 以当前时间为最近一次加载时间创建时间表
    pub fn stamped(now: i64, interval: u64) -> Self {
        Self {
            last_check: now,
            next_check: now.saturating_add(interval_secs(interval)),
        }
    }

    /// 最近一次成功加载的时间
    pub fn last_check(&self) -> i64 {
        self.last_check
    }

    /// 下一次允许检查文件的时间
    pub fn next_check(&self) -> i64 {
        self.next_check
    }

    /// 检查间隔是否已到
    pub fn is_due(&self, now: i64) -> bool {
        now >= self.next_check
    }

    /// 推迟下一次检查，保留最近一次加载时间
    pub fn rearm(&mut self, now: i64, interval: u64) {
        self.next_check = now.saturating_add(interval_secs(interval));
    }
}

/// 文件变更检测器 trait
pub trait ChangeDetector: Send + Sync {
    /// 获取文件修改时间（Unix 秒）
    fn modified_secs(&self, path: &Path) -> ConfigResult<i64>;

    /// 文件是否在 `since` 之后（含）被修改
    fn modified_since(&self, path: &Path, since: i64) -> ConfigResult<bool> {
        Ok(self.modified_secs(path)? >= since)
    }

    /// 返回第一个发生变更的文件
    ///
    /// 获取状态失败的文件记录日志后视为未变更，扫描继续。
    fn first_changed(&self, paths: &[PathBuf], since: i64) -> Option<PathBuf> {
        for path in paths {
            trace!("检查文件: {}", path.display());
            match self.modified_since(path, since) {
                Ok(true) => {
                    trace!("文件 {} 在 {} 之后被修改", path.display(), since);
                    return Some(path.clone());
                }
                Ok(false) => {}
                Err(e @ ConfigError::StatFailure { .. }) => error!("{}", e),
                Err(e) => error!("检查文件 {} 失败: {}", path.display(), e),
            }
        }
        None
    }
}
