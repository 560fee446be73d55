//! 资源包注册表

use crate::bundle::ResourceBundle;
use crate::properties::PropertiesFile;
use config_abstractions::BundleOptions;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// 全局资源包注册表
static GLOBAL_BUNDLE_REGISTRY: Lazy<BundleRegistry> = Lazy::new(BundleRegistry::new);

/// 资源包注册表，按基础名索引
#[derive(Debug, Default)]
pub struct BundleRegistry {
    bundles: DashMap<String, Arc<ResourceBundle>>,
}

impl BundleRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 全局注册表
    pub fn global() -> &'static Self {
        &GLOBAL_BUNDLE_REGISTRY
    }

    /// 注册资源包，同名资源包被替换并返回
    pub fn register(&self, bundle: Arc<ResourceBundle>) -> Option<Arc<ResourceBundle>> {
        let name = bundle.base_name().to_string();
        let previous = self.bundles.insert(name.clone(), bundle);
        if previous.is_some() {
            debug!("替换已注册的资源包: {}", name);
        } else {
            debug!("注册资源包: {}", name);
        }
        previous
    }

    /// 创建并注册资源包
    pub fn create_bundle(
        &self,
        base_path: impl Into<PathBuf>,
        base_name: impl Into<String>,
        options: BundleOptions,
    ) -> Arc<ResourceBundle> {
        let bundle = Arc::new(ResourceBundle::new(base_path, base_name, options));
        self.register(Arc::clone(&bundle));
        bundle
    }

    /// 获取资源包
    pub fn get_bundle(&self, base_name: &str) -> Option<Arc<ResourceBundle>> {
        let bundle = self
            .bundles
            .get(base_name)
            .map(|entry| Arc::clone(entry.value()));
        if bundle.is_none() {
            warn!("资源包 {} 未加载，请先创建并加载 ResourceBundle", base_name);
        }
        bundle
    }

    /// 获取资源包中语言对应的文件
    pub fn get_locale_file(
        &self,
        base_name: &str,
        locale: Option<&str>,
    ) -> Option<Arc<PropertiesFile>> {
        self.get_bundle(base_name)?.get_locale_file(locale)
    }

    /// 移除资源包
    pub fn remove(&self, base_name: &str) -> Option<Arc<ResourceBundle>> {
        self.bundles.remove(base_name).map(|(_, bundle)| bundle)
    }

    /// 已注册的资源包名称，按字母排序
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .bundles
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// 资源包数量
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
