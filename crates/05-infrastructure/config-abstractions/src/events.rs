//! 配置重载事件定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 配置重载事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigReloadEvent {
    /// 触发方式
    pub trigger: ReloadTrigger,
    /// 配置目录
    pub directory: PathBuf,
    /// 本次加载的文件（主配置文件在前）
    pub files: Vec<PathBuf>,
    /// 合并后的键数量
    pub key_count: usize,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ConfigReloadEvent {
    /// 创建重载事件
    pub fn new(
        trigger: ReloadTrigger,
        directory: impl Into<PathBuf>,
        files: Vec<PathBuf>,
        key_count: usize,
    ) -> Self {
        Self {
            trigger,
            directory: directory.into(),
            files,
            key_count,
            timestamp: chrono::Utc::now(),
        }
    }

    /// 是否由文件变更触发
    pub fn is_file_change(&self) -> bool {
        self.trigger == ReloadTrigger::FileChange
    }
}

/// 重载触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReloadTrigger {
    /// 调用方显式加载
    Explicit,
    /// 读取配置时检测到文件变更
    FileChange,
}

/// 配置重载监听器 trait
///
/// 每次加载成功后按注册顺序同步调用。
pub trait ConfigReloadListener: Send + Sync {
    /// 处理重载事件
    fn on_reload(&self, event: &ConfigReloadEvent);

    /// 监听器名称
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> ConfigReloadListener for F
where
    F: Fn(&ConfigReloadEvent) + Send + Sync,
{
    fn on_reload(&self, event: &ConfigReloadEvent) {
        self(event);
    }
}
