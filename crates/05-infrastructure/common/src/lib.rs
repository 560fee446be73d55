//! # Infrastructure Common
//!
//! 配置基础设施的公共部分：错误类型、时间源和日志初始化。
//!
//! ## 核心组件
//!
//! - [`ConfigError`] - 配置与资源包加载错误
//! - [`Clock`] - 可注入的时间源
//! - [`LoggingConfig`] - 日志配置

pub mod clock;
pub mod errors;
pub mod logging;

pub use clock::*;
pub use errors::*;
pub use logging::*;
