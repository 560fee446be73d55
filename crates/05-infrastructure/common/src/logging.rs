//! 日志系统初始化

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// 过滤指令，例如 `info` 或 `config_impl=trace`
    pub filter: String,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否使用 JSON 格式输出
    pub json_format: bool,
}

impl LoggingConfig {
    /// 开发环境配置
    pub fn development() -> Self {
        Self {
            filter: "debug".to_string(),
            show_target: true,
            json_format: false,
        }
    }

    /// 生产环境配置
    pub fn production() -> Self {
        Self {
            filter: "info".to_string(),
            show_target: false,
            json_format: true,
        }
    }

    /// 构建过滤器，`RUST_LOG` 优先于配置中的指令
    fn env_filter(&self) -> ConfigResult<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .map_err(|e| ConfigError::LoggingError {
                message: format!("过滤指令无效 '{}': {}", self.filter, e),
            })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            show_target: true,
            json_format: false,
        }
    }
}

/// 初始化全局日志订阅器
///
/// 重复初始化返回 [`ConfigError::LoggingError`]。
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.show_target);

    if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| ConfigError::LoggingError {
        message: e.to_string(),
    })?;

    tracing::info!("日志系统初始化完成");
    Ok(())
}
