//! # Configuration Implementation
//!
//! 基于属性文件的配置存储和多语言资源包，读取时按间隔轮询文件修改时间并自动重载。
//!
//! ## 主要组件
//!
//! - [`ConfigStore`] - 主配置文件 + 子文件的合并配置
//! - [`ResourceBundle`] - 按语言划分的资源包
//! - [`BundleRegistry`] - 按基础名索引的资源包注册表
//! - [`LocaleContext`] - 当前语言
//! - [`PropertiesFile`] - 属性文件解析

pub mod bundle;
pub mod locale;
pub mod properties;
pub mod registry;
pub mod store;
pub mod watcher;

pub use bundle::*;
pub use locale::*;
pub use properties::*;
pub use registry::*;
pub use store::*;
pub use watcher::*;

#[cfg(test)]
mod tests;
