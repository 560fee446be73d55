//! 重载选项定义

use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// 默认主配置文件名
pub const DEFAULT_MASTER_FILE_NAME: &str = "master-config.properties";
/// 配置存储默认检查间隔（秒）
pub const DEFAULT_CONFIG_CHECK_INTERVAL_SECS: u64 = 10;
/// 资源包默认检查间隔（秒）
pub const DEFAULT_BUNDLE_CHECK_INTERVAL_SECS: u64 = 60;

/// 配置存储选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigStoreOptions {
    /// 主配置文件名，相对于配置目录
    pub master_file_name: String,
    /// 文件变更后是否自动重载
    pub reload_on_change: bool,
    /// 两次文件检查之间的最小间隔（秒）
    #[serde(alias = "checkReloadTimeSec", alias = "checkReloadIntervalSeconds")]
    pub check_reload_interval_secs: u64,
}

impl ConfigStoreOptions {
    /// 设置主配置文件名
    pub fn with_master_file_name(mut self, name: impl Into<String>) -> Self {
        self.master_file_name = name.into();
        self
    }

    /// 设置是否自动重载
    pub fn with_reload_on_change(mut self, enabled: bool) -> Self {
        self.reload_on_change = enabled;
        self
    }

    /// 设置检查间隔
    pub fn with_check_interval(mut self, secs: u64) -> Self {
        self.check_reload_interval_secs = secs;
        self
    }

    /// 验证选项
    pub fn validate(&self) -> ConfigResult<()> {
        if self.master_file_name.trim().is_empty() {
            return Err(ConfigError::invalid_options("主配置文件名不能为空"));
        }
        if self.master_file_name.contains(['/', '\\']) {
            return Err(ConfigError::invalid_options(format!(
                "主配置文件名不能包含路径分隔符: {}",
                self.master_file_name
            )));
        }
        Ok(())
    }

    /// 从 JSON 解析并验证选项，缺失字段使用默认值
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::invalid_options(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }
}

impl Default for ConfigStoreOptions {
    fn default() -> Self {
        Self {
            master_file_name: DEFAULT_MASTER_FILE_NAME.to_string(),
            reload_on_change: true,
            check_reload_interval_secs: DEFAULT_CONFIG_CHECK_INTERVAL_SECS,
        }
    }
}

/// 资源包文件名中基础名与语言之间的分隔符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleDelimiter {
    /// `msgs_fr.properties`
    Underscore,
    /// `msgs-fr.properties`
    Hyphen,
    /// 两者皆可
    #[default]
    Any,
}

impl LocaleDelimiter {
    /// 对应的正则字符类
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Underscore => "_",
            Self::Hyphen => "-",
            Self::Any => "[-_]",
        }
    }
}

/// 资源包选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleOptions {
    /// 文件变更后是否自动重载
    pub reload_on_change: bool,
    /// 每个语言文件两次检查之间的最小间隔（秒）
    #[serde(alias = "checkReloadTimeSec", alias = "checkReloadIntervalSeconds")]
    pub check_reload_interval_secs: u64,
    /// 文件名分隔符
    pub delimiter: LocaleDelimiter,
}

impl BundleOptions {
    /// 设置是否自动重载
    pub fn with_reload_on_change(mut self, enabled: bool) -> Self {
        self.reload_on_change = enabled;
        self
    }

    /// 设置检查间隔
    pub fn with_check_interval(mut self, secs: u64) -> Self {
        self.check_reload_interval_secs = secs;
        self
    }

    /// 设置文件名分隔符
    pub fn with_delimiter(mut self, delimiter: LocaleDelimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// 从 JSON 解析选项
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConfigError::invalid_options(e.to_string()))
    }
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            reload_on_change: true,
            check_reload_interval_secs: DEFAULT_BUNDLE_CHECK_INTERVAL_SECS,
            delimiter: LocaleDelimiter::Any,
        }
    }
}
