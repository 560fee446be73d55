//! 多语言资源包
//!
//! 资源包由目录中名为 `<基础名><分隔符><语言>.properties` 的文件组成，
//! 每个语言文件有独立的检查时间表，互不影响。

use crate::locale::LocaleContext;
use crate::properties::PropertiesFile;
use crate::watcher::MtimeChangeDetector;
use config_abstractions::{BundleOptions, ChangeDetector, LocaleDelimiter, ReloadSchedule};
use infrastructure_common::{Clock, ConfigError, ConfigResult, SystemClock};
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// 单个语言文件
#[derive(Debug)]
struct LocaleEntry {
    properties: Arc<PropertiesFile>,
    file_path: PathBuf,
    schedule: ReloadSchedule,
}

/// 资源包
pub struct ResourceBundle {
    base_path: PathBuf,
    base_name: String,
    options: RwLock<BundleOptions>,
    /// 语言 -> 文件
    files: RwLock<HashMap<String, LocaleEntry>>,
    locale_context: Arc<LocaleContext>,
    clock: Arc<dyn Clock>,
    detector: Arc<dyn ChangeDetector>,
}

impl std::fmt::Debug for ResourceBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBundle")
            .field("base_path", &self.base_path)
            .field("base_name", &self.base_name)
            .field("options", &*self.options.read())
            .field("locales", &self.locales())
            .finish()
    }
}

impl ResourceBundle {
    /// 创建资源包，文件需通过 [`ResourceBundle::load_files`] 加载
    pub fn new(
        base_path: impl Into<PathBuf>,
        base_name: impl Into<String>,
        options: BundleOptions,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            base_name: base_name.into(),
            options: RwLock::new(options),
            files: RwLock::new(HashMap::new()),
            locale_context: LocaleContext::global(),
            clock: Arc::new(SystemClock),
            detector: Arc::new(MtimeChangeDetector),
        }
    }

    /// 设置时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 设置语言上下文
    pub fn with_locale_context(mut self, context: Arc<LocaleContext>) -> Self {
        self.locale_context = context;
        self
    }

    /// 设置文件变更检测器
    pub fn with_change_detector(mut self, detector: Arc<dyn ChangeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// 资源包目录
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 资源包基础名
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// 当前选项
    pub fn options(&self) -> BundleOptions {
        self.options.read().clone()
    }

    /// 更新选项，对之后的检查生效
    pub fn set_options(&self, options: BundleOptions) {
        debug!("更新资源包 {} 的选项: {:?}", self.base_name, options);
        *self.options.write() = options;
    }

    /// 扫描目录并加载所有语言文件
    ///
    /// 目录不可读或任一文件解析失败时返回 [`ConfigError::BundleLoadError`]，
    /// 已加载的文件保持不变。
    pub fn load_files(&self) -> ConfigResult<()> {
        trace!(
            "加载资源包文件, 目录: {}, 基础名: {}",
            self.base_path.display(),
            self.base_name
        );
        let options = self.options();
        let pattern = locale_pattern(&self.base_name, options.delimiter)
            .map_err(|e| self.load_error(e))?;
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| self.load_error(e))?;
        let now = self.clock.now_secs();
        let mut files = HashMap::new();

        for entry in entries {
            let entry = entry.map_err(|e| self.load_error(e))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                warn!("忽略非 UTF-8 文件名: {:?}", file_name);
                continue;
            };
            if !file_name.starts_with(&self.base_name) {
                trace!("文件 {} 不属于资源包 {}", file_name, self.base_name);
                continue;
            }
            let Some(locale) = capture_locale(&pattern, file_name) else {
                warn!("文件 {} 的名称格式不正确，忽略此文件", file_name);
                continue;
            };
            let file_path = entry.path();
            if !file_path.is_file() {
                trace!("{} 不是普通文件，忽略", file_path.display());
                continue;
            }

            let properties = PropertiesFile::from_path(&file_path)
                .map_err(|e| self.load_error(e))?;
            trace!("语言 {} 对应文件 {}", locale, file_path.display());
            let previous = files.insert(
                locale.clone(),
                LocaleEntry {
                    properties: Arc::new(properties),
                    file_path,
                    schedule: ReloadSchedule::stamped(now, options.check_reload_interval_secs),
                },
            );
            if previous.is_some() {
                warn!("资源包 {} 中语言 {} 存在多个文件", self.base_name, locale);
            }
        }

        let mut locales: Vec<&String> = files.keys().collect();
        locales.sort();
        info!("资源包 {} 加载完成, 语言: {:?}", self.base_name, locales);
        *self.files.write() = files;
        Ok(())
    }

    /// 加载文件，结果交给回调而不是返回
    pub fn load_files_with<F>(&self, callback: F)
    where
        F: FnOnce(ConfigResult<()>),
    {
        callback(self.load_files());
    }

    /// 在阻塞线程池中加载文件
    pub async fn load_files_async(self: &Arc<Self>) -> ConfigResult<()> {
        let bundle = Arc::clone(self);
        tokio::task::spawn_blocking(move || bundle.load_files())
            .await
            .map_err(|e| self.load_error(format!("加载任务失败: {e}")))?
    }

    /// 所有语言文件快照
    pub fn files(&self) -> HashMap<String, Arc<PropertiesFile>> {
        self.files
            .read()
            .iter()
            .map(|(locale, entry)| (locale.clone(), Arc::clone(&entry.properties)))
            .collect()
    }

    /// 已加载的语言，按字母排序
    pub fn locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self.files.read().keys().cloned().collect();
        locales.sort();
        locales
    }

    /// 获取语言对应的文件
    ///
    /// 未指定语言时使用语言上下文的当前语言。先精确匹配，再尝试 `_` 之前的语言部分
    /// （`en_US` -> `en`），都没有时返回 `None`。
    pub fn get_locale_file(&self, locale: Option<&str>) -> Option<Arc<PropertiesFile>> {
        let locale = locale.map_or_else(|| self.locale_context.locale(), str::to_string);
        let resolved = self.resolve_locale(&locale)?;
        self.refresh_entry_if_stale(&resolved);
        self.files
            .read()
            .get(&resolved)
            .map(|entry| Arc::clone(&entry.properties))
    }

    fn resolve_locale(&self, locale: &str) -> Option<String> {
        let files = self.files.read();
        if files.contains_key(locale) {
            return Some(locale.to_string());
        }
        if let Some(index) = locale.find('_').filter(|index| *index > 0) {
            let language = &locale[..index];
            trace!("查找语言 {}", language);
            if files.contains_key(language) {
                return Some(language.to_string());
            }
        }
        warn!("资源包 {} 没有语言 {} 对应的文件", self.base_name, locale);
        None
    }

    /// 检查单个语言文件，变更时重新解析，失败时继续使用旧内容
    fn refresh_entry_if_stale(&self, locale: &str) {
        let options = self.options();
        if !options.reload_on_change {
            return;
        }
        let now = self.clock.now_secs();
        let (file_path, since) = {
            let files = self.files.read();
            let Some(entry) = files.get(locale) else {
                return;
            };
            if !entry.schedule.is_due(now) {
                return;
            }
            (entry.file_path.clone(), entry.schedule.last_check())
        };

        match self.detector.modified_since(&file_path, since) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                error!("{}", e);
                return;
            }
        }

        info!("资源文件 {} 已变更，重新加载", file_path.display());
        let interval = options.check_reload_interval_secs;
        let reloaded = PropertiesFile::from_path(&file_path);
        let mut files = self.files.write();
        let Some(entry) = files.get_mut(locale) else {
            return;
        };
        match reloaded {
            Ok(properties) => {
                entry.properties = Arc::new(properties);
                entry.schedule = ReloadSchedule::stamped(now, interval);
            }
            Err(e) => {
                error!("资源文件 {} 重新加载失败，继续使用旧内容: {}", file_path.display(), e);
                entry.schedule.rearm(now, interval);
            }
        }
    }

    fn load_error(&self, error: impl Display) -> ConfigError {
        error!(
            "资源包 {} ({}) 加载失败: {}",
            self.base_name,
            self.base_path.display(),
            error
        );
        ConfigError::bundle_load(&self.base_path, &self.base_name, error.to_string())
    }
}

/// 从文件名中提取语言
///
/// `extract_locale("msgs_fr_FR.properties", "msgs", LocaleDelimiter::Any)` 返回 `fr_FR`。
pub fn extract_locale(
    file_name: &str,
    base_name: &str,
    delimiter: LocaleDelimiter,
) -> Option<String> {
    let pattern = locale_pattern(base_name, delimiter).ok()?;
    capture_locale(&pattern, file_name)
}

fn locale_pattern(base_name: &str, delimiter: LocaleDelimiter) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"^{}{}(.+)\.properties$",
        regex::escape(base_name),
        delimiter.pattern()
    ))
}

fn capture_locale(pattern: &Regex, file_name: &str) -> Option<String> {
    pattern
        .captures(file_name)
        .and_then(|captures| captures.get(1))
        .map(|locale| locale.as_str().to_string())
}
