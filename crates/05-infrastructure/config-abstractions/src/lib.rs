//! # Configuration Abstractions
//!
//! 配置访问抽象层，定义属性读取、重载选项和重载事件。
//!
//! ## 核心接口
//!
//! - [`PropertySource`] - 多值属性读取接口
//! - [`ChangeDetector`] - 文件变更检测接口
//! - [`ReloadSchedule`] - 轮询检查时间表
//! - [`ConfigReloadListener`] - 重载监听接口

pub mod events;
pub mod options;
pub mod provider;
pub mod watcher;

pub use events::*;
pub use options::*;
pub use provider::*;
pub use watcher::*;
