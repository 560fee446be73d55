//! 配置读取抽象接口

/// 属性来源 trait
///
/// 一个键可以对应多个值（多个文件定义同一个键时按加载顺序追加），
/// 单值读取默认取最后一个值，即后加载的文件覆盖先加载的文件。
pub trait PropertySource: Send + Sync {
    /// 获取键的全部值，按加载顺序排列
    fn get_all(&self, key: &str) -> Option<Vec<String>>;

    /// 获取所有键，按首次出现顺序排列
    fn keys(&self) -> Vec<String>;

    /// 获取来源名称
    fn name(&self) -> &str;

    /// 获取第一个值（最先加载的文件）
    fn get_first(&self, key: &str) -> Option<String> {
        self.get_all(key)
            .and_then(|values| values.into_iter().next())
    }

    /// 获取最后一个值（最后加载的文件）
    fn get_last(&self, key: &str) -> Option<String> {
        self.get_all(key).and_then(|mut values| values.pop())
    }

    /// 获取配置值，等同于 [`PropertySource::get_last`]
    fn get(&self, key: &str) -> Option<String> {
        self.get_last(key)
    }

    /// 获取配置值，不存在时返回默认值
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// 检查键是否存在
    fn contains_key(&self, key: &str) -> bool {
        self.get_all(key).is_some()
    }

    /// 获取整数值，不存在或无法解析时返回默认值
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|value| parse_int(&value))
            .unwrap_or(default)
    }

    /// 获取浮点值，不存在或无法解析时返回默认值
    fn get_float(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|value| parse_float(&value))
            .unwrap_or(default)
    }

    /// 获取布尔值，不存在或无法解析时返回默认值
    fn get_boolean(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|value| parse_bool(&value))
            .unwrap_or(default)
    }
}

/// 解析整数
pub fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// 解析浮点数，拒绝 NaN
pub fn parse_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| !parsed.is_nan())
}

/// 解析布尔值，只接受 `true` / `false`（不区分大小写）
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
