//! 错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("主配置文件不存在或不是普通文件: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("配置文件读取失败: {path}, 原因: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置解析失败: {path}:{line}, 原因: {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("资源包加载失败: {path} ({base_name}), 原因: {message}")]
    BundleLoadError {
        path: PathBuf,
        base_name: String,
        message: String,
    },

    #[error("获取文件状态失败: {path}, 原因: {source}")]
    StatFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置选项无效: {message}")]
    InvalidOptions { message: String },

    #[error("配置尚未加载")]
    NotLoaded,

    #[error("日志初始化失败: {message}")]
    LoggingError { message: String },
}

impl ConfigError {
    /// 创建文件读取错误
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.into(),
            source,
        }
    }

    /// 创建选项无效错误
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// 创建资源包加载错误
    pub fn bundle_load(
        path: impl Into<PathBuf>,
        base_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::BundleLoadError {
            path: path.into(),
            base_name: base_name.into(),
            message: message.into(),
        }
    }

    /// 是否为主配置文件缺失错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound { .. })
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
