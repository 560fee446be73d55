//! 当前语言上下文

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

/// 全局语言上下文
static GLOBAL_LOCALE_CONTEXT: Lazy<Arc<LocaleContext>> =
    Lazy::new(|| Arc::new(LocaleContext::default()));

/// 语言上下文
///
/// 保存当前语言，资源包查询未指定语言时使用它。
#[derive(Debug)]
pub struct LocaleContext {
    /// 当前语言
    current: RwLock<String>,
    /// 无法识别请求语言时使用的语言
    fallback: String,
    /// 支持的语言（只含语言部分，如 `en`）
    supported: Vec<String>,
}

impl LocaleContext {
    /// 默认语言
    pub const DEFAULT_LOCALE: &'static str = "fr";

    /// 创建语言上下文，当前语言初始化为回退语言
    pub fn new(fallback: impl Into<String>, supported: Vec<String>) -> Self {
        let fallback = fallback.into();
        Self {
            current: RwLock::new(fallback.clone()),
            fallback,
            supported,
        }
    }

    /// 获取全局语言上下文
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_LOCALE_CONTEXT)
    }

    /// 当前语言
    pub fn locale(&self) -> String {
        self.current.read().clone()
    }

    /// 设置当前语言
    pub fn set_locale(&self, locale: impl Into<String>) {
        let locale = locale.into();
        debug!("设置当前语言: {}", locale);
        *self.current.write() = locale;
    }

    /// 回退语言
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// 支持的语言
    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    /// 根据 `Accept-Language` 头选择语言并设为当前语言
    ///
    /// 按头部出现顺序取第一个受支持的语言，没有时使用回退语言。
    pub fn locale_from_accept_language(&self, header: Option<&str>) -> String {
        trace!("Accept-Language: {:?}", header);
        let locale = header
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(language_of_range)
            .find(|language| self.supported.iter().any(|s| s == language))
            .unwrap_or_else(|| self.fallback.clone());

        debug!("从 Accept-Language 得到语言: {}", locale);
        self.set_locale(locale.clone());
        locale
    }
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_LOCALE,
            vec!["fr".to_string(), "en".to_string(), "de".to_string()],
        )
    }
}

/// 取语言范围的语言部分，`en-US;q=0.8` -> `en`
fn language_of_range(range: &str) -> Option<String> {
    let tag = range.split(';').next().unwrap_or_default().trim();
    let language = tag.split(['-', '_']).next().unwrap_or_default();
    if language.is_empty() || language == "*" {
        None
    } else {
        Some(language.to_ascii_lowercase())
    }
}
