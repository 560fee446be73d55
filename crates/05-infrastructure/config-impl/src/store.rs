//! 主配置文件驱动的配置存储
//!
//! 主配置文件的每个值都是相对于配置目录的子文件路径，所有子文件按主配置文件中的
//! 顺序合并到同一个键空间。读取配置时按检查间隔轮询文件修改时间，发现变更后整体重载。

use crate::properties::PropertiesFile;
use crate::watcher::MtimeChangeDetector;
use config_abstractions::{
    ChangeDetector, ConfigReloadEvent, ConfigReloadListener, ConfigStoreOptions, PropertySource,
    ReloadSchedule, ReloadTrigger,
};
use infrastructure_common::{Clock, ConfigError, ConfigResult, SystemClock};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, error, info, trace};

/// 一次成功加载的完整状态，重载时整体替换
#[derive(Debug)]
struct LoadedConfig {
    directory: PathBuf,
    options: ConfigStoreOptions,
    /// 主配置文件在第一位
    tracked_files: Vec<PathBuf>,
    config: Arc<PropertiesFile>,
    schedule: ReloadSchedule,
}

/// 配置存储
///
/// 加载失败时保留之前成功加载的配置。
pub struct ConfigStore {
    /// 当前配置
    state: RwLock<Option<LoadedConfig>>,
    /// 重载监听器（按注册顺序）
    listeners: RwLock<Vec<Arc<dyn ConfigReloadListener>>>,
    /// 串行化加载
    reload_lock: Mutex<()>,
    /// 正在调用监听器的线程，这些线程内的读取不触发重载。
    /// 其他线程照常检查文件变更。
    notifying: Mutex<Vec<ThreadId>>,
    clock: Arc<dyn Clock>,
    detector: Arc<dyn ChangeDetector>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("state", &*self.state.read())
            .field("listeners_count", &self.listeners.read().len())
            .finish()
    }
}

impl ConfigStore {
    /// 创建使用系统时钟的配置存储
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 创建使用指定时钟的配置存储
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
            reload_lock: Mutex::new(()),
            notifying: Mutex::new(Vec::new()),
            clock,
            detector: Arc::new(MtimeChangeDetector),
        }
    }

    /// 设置文件变更检测器
    pub fn with_change_detector(mut self, detector: Arc<dyn ChangeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// 加载配置目录
    ///
    /// 主配置文件不存在或不是普通文件时返回 [`ConfigError::ConfigNotFound`]。
    /// 任何失败都不会影响之前已加载的配置。
    pub fn load_config(
        &self,
        directory: impl AsRef<Path>,
        options: ConfigStoreOptions,
    ) -> ConfigResult<()> {
        self.reload(directory.as_ref(), options, ReloadTrigger::Explicit)
            .map(|_| ())
    }

    /// 用上次加载的目录和选项重新加载
    ///
    /// 从未成功加载过时返回 [`ConfigError::NotLoaded`]。
    pub fn reload_config(&self) -> ConfigResult<()> {
        let (directory, options) = self
            .state
            .read()
            .as_ref()
            .map(|loaded| (loaded.directory.clone(), loaded.options.clone()))
            .ok_or(ConfigError::NotLoaded)?;
        self.load_config(directory, options)
    }

    /// 检查被跟踪的文件是否在上次加载后发生变更
    ///
    /// 检查间隔未到时直接返回 `false`，不访问文件系统。
    pub fn check_file_changes(&self) -> bool {
        let now = self.clock.now_secs();
        let state = self.state.read();
        let Some(loaded) = state.as_ref() else {
            return false;
        };
        if !loaded.options.reload_on_change {
            return false;
        }

        trace!(
            "检查文件变更, 当前时间: {}, 上次加载时间: {}",
            now,
            loaded.schedule.last_check()
        );
        if !loaded.schedule.is_due(now) {
            trace!("检查间隔未到");
            return false;
        }

        self.detector
            .first_changed(&loaded.tracked_files, loaded.schedule.last_check())
            .is_some()
    }

    /// 注册重载监听器
    pub fn add_listener<L>(&self, listener: L)
    where
        L: ConfigReloadListener + 'static,
    {
        self.add_shared_listener(Arc::new(listener));
    }

    /// 注册共享的重载监听器
    pub fn add_shared_listener(&self, listener: Arc<dyn ConfigReloadListener>) {
        debug!("注册配置重载监听器: {}", listener.name());
        self.listeners.write().push(listener);
    }

    /// 监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// 当前配置快照，未加载时为空
    pub fn config(&self) -> Arc<PropertiesFile> {
        self.state
            .read()
            .as_ref()
            .map_or_else(
                || Arc::new(PropertiesFile::new()),
                |loaded| Arc::clone(&loaded.config),
            )
    }

    /// 当前选项
    pub fn options(&self) -> Option<ConfigStoreOptions> {
        self.state
            .read()
            .as_ref()
            .map(|loaded| loaded.options.clone())
    }

    /// 配置目录
    pub fn directory(&self) -> Option<PathBuf> {
        self.state
            .read()
            .as_ref()
            .map(|loaded| loaded.directory.clone())
    }

    /// 被跟踪的文件，主配置文件在第一位
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        self.state
            .read()
            .as_ref()
            .map(|loaded| loaded.tracked_files.clone())
            .unwrap_or_default()
    }

    /// 当前检查时间表
    pub fn schedule(&self) -> Option<ReloadSchedule> {
        self.state.read().as_ref().map(|loaded| loaded.schedule)
    }

    /// 是否已成功加载
    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    /// 如有变更则重新加载，失败时继续使用旧配置
    fn refresh_if_stale(&self) {
        if self.is_notifying() || !self.check_file_changes() {
            return;
        }
        let Some((directory, options)) = self
            .state
            .read()
            .as_ref()
            .map(|loaded| (loaded.directory.clone(), loaded.options.clone()))
        else {
            return;
        };

        info!("配置文件已变更，重新加载配置");
        if let Err(e) = self.reload(&directory, options, ReloadTrigger::FileChange) {
            error!("配置重新加载失败，继续使用之前的配置: {}", e);
            let now = self.clock.now_secs();
            if let Some(loaded) = self.state.write().as_mut() {
                loaded
                    .schedule
                    .rearm(now, loaded.options.check_reload_interval_secs);
            }
        }
    }

    /// 加载并发布新配置，返回是否实际加载
    fn reload(
        &self,
        directory: &Path,
        options: ConfigStoreOptions,
        trigger: ReloadTrigger,
    ) -> ConfigResult<bool> {
        let event = {
            let _guard = self.reload_lock.lock();

            // 其他调用者可能已经完成了重载
            if trigger == ReloadTrigger::FileChange && !self.check_file_changes() {
                return Ok(false);
            }

            let loaded = self.build(directory, options)?;
            let event = ConfigReloadEvent::new(
                trigger,
                &loaded.directory,
                loaded.tracked_files.clone(),
                loaded.config.len(),
            );
            *self.state.write() = Some(loaded);
            event
        };

        self.notify(&event);
        Ok(true)
    }

    /// 读取主配置文件和所有子文件
    fn build(&self, directory: &Path, options: ConfigStoreOptions) -> ConfigResult<LoadedConfig> {
        options.validate()?;
        info!("从目录 {} 加载配置, 选项: {:?}", directory.display(), options);

        let master_path = directory.join(&options.master_file_name);
        match fs::metadata(&master_path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                error!("主配置文件 {} 不是普通文件，停止加载", master_path.display());
                return Err(ConfigError::ConfigNotFound { path: master_path });
            }
            Err(e) => {
                error!("主配置文件 {} 不存在: {}，停止加载", master_path.display(), e);
                return Err(ConfigError::ConfigNotFound { path: master_path });
            }
        }

        let master = PropertiesFile::from_path(&master_path)?;
        let mut config = master.clone();
        let mut tracked_files = vec![master_path];

        for key in master.keys() {
            for file_name in master.get_all(key).unwrap_or_default() {
                let sub_path = directory.join(file_name);
                trace!("加载子配置文件 {} (键 {})", sub_path.display(), key);
                config.add_file(&sub_path)?;
                tracked_files.push(sub_path);
            }
        }
        debug!("已加载文件: {:?}", tracked_files);

        let now = self.clock.now_secs();
        Ok(LoadedConfig {
            directory: directory.to_path_buf(),
            schedule: ReloadSchedule::stamped(now, options.check_reload_interval_secs),
            options,
            tracked_files,
            config: Arc::new(config),
        })
    }

    /// 当前线程是否正在调用监听器
    fn is_notifying(&self) -> bool {
        let current = thread::current().id();
        self.notifying.lock().contains(&current)
    }

    /// 按注册顺序调用监听器
    fn notify(&self, event: &ConfigReloadEvent) {
        let listeners = self.listeners.read().clone();
        let current = thread::current().id();
        self.notifying.lock().push(current);
        for listener in &listeners {
            trace!("调用监听器: {}", listener.name());
            listener.on_reload(event);
        }
        let mut notifying = self.notifying.lock();
        if let Some(index) = notifying.iter().position(|id| *id == current) {
            notifying.swap_remove(index);
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertySource for ConfigStore {
    fn get_all(&self, key: &str) -> Option<Vec<String>> {
        self.refresh_if_stale();
        self.state
            .read()
            .as_ref()?
            .config
            .get_all(key)
            .map(<[String]>::to_vec)
    }

    fn keys(&self) -> Vec<String> {
        self.config().keys().to_vec()
    }

    fn name(&self) -> &str {
        "ConfigStore"
    }
}
