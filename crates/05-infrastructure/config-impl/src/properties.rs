//! Java 风格属性文件解析
//!
//! 支持 `#` / `!` 注释、`=` / `:` / 空白分隔符、行尾 `\` 续行以及常见转义。
//! 同一个键出现多次时按出现顺序追加值，不会覆盖。

use config_abstractions::PropertySource;
use infrastructure_common::{ConfigError, ConfigResult};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::Chars;
use tracing::{debug, trace};

/// 属性文件集合
///
/// 可以通过 [`PropertiesFile::add_file`] 合并多个文件到同一个键空间。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertiesFile {
    /// 键，按首次出现顺序
    keys: Vec<String>,
    /// 键对应的值，按加载顺序
    values: HashMap<String, Vec<String>>,
    /// 已合并的文件
    files: Vec<PathBuf>,
}

impl PropertiesFile {
    /// 创建空的属性集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 从文件加载
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let mut properties = Self::new();
        properties.add_file(path)?;
        Ok(properties)
    }

    /// 从字符串解析
    pub fn parse_str(content: &str) -> ConfigResult<Self> {
        let mut properties = Self::new();
        for (key, value) in parse_entries(content, Path::new("<string>"))? {
            properties.insert(key, value);
        }
        Ok(properties)
    }

    /// 合并一个文件，已有键的值向后追加
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        debug!("加载属性文件: {}", path.display());

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::file_read(path, e))?;
        let entries = parse_entries(&content, path)?;
        trace!("属性文件 {} 包含 {} 项", path.display(), entries.len());

        for (key, value) in entries {
            self.insert(key, value);
        }
        self.files.push(path.to_path_buf());
        Ok(())
    }

    /// 合并另一个属性集合
    pub fn merge(&mut self, other: &Self) {
        for key in &other.keys {
            for value in &other.values[key] {
                self.insert(key.clone(), value.clone());
            }
        }
        self.files.extend(other.files.iter().cloned());
    }

    /// 追加一个值
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.values.get_mut(&key) {
            Some(values) => values.push(value.into()),
            None => {
                self.keys.push(key.clone());
                self.values.insert(key, vec![value.into()]);
            }
        }
    }

    /// 获取最后一个值
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// 获取第一个值
    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// 获取全部值
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// 所有键
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 已合并的文件
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// 键数量
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl PropertySource for PropertiesFile {
    fn get_all(&self, key: &str) -> Option<Vec<String>> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.keys.clone()
    }

    fn name(&self) -> &str {
        "PropertiesFile"
    }
}

/// 解析文件内容为键值对列表
fn parse_entries(content: &str, path: &Path) -> ConfigResult<Vec<(String, String)>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut entries = Vec::new();
    let mut lines = content.lines().enumerate();

    while let Some((index, raw)) = lines.next() {
        let line_no = index + 1;
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        entries.push((
            unescape(key, path, line_no)?,
            unescape(value, path, line_no)?,
        ));
    }

    Ok(entries)
}

/// 行尾是否为奇数个反斜杠
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// 拆分键和值，键在第一个未转义的 `=`、`:` 或空白处结束
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start();
    let rest = rest.strip_prefix(['=', ':']).map_or(rest, str::trim_start);
    (&line[..key_end], rest)
}

/// 处理转义序列
fn unescape(raw: &str, path: &Path, line: usize) -> ConfigResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000c}'),
            Some('u') => out.push(read_unicode_escape(&mut chars, path, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// 读取 `\uXXXX`（已消费 `\u`），支持 UTF-16 代理对
fn read_unicode_escape(chars: &mut Chars<'_>, path: &Path, line: usize) -> ConfigResult<char> {
    let invalid = |message: &str| ConfigError::ParseError {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    };

    let high = read_hex4(chars).ok_or_else(|| invalid("无效的 \\u 转义"))?;
    if let Some(c) = char::from_u32(high) {
        return Ok(c);
    }
    if !(0xD800..=0xDBFF).contains(&high) {
        return Err(invalid("孤立的低位代理"));
    }

    let mut lookahead = chars.clone();
    if lookahead.next() != Some('\\') || lookahead.next() != Some('u') {
        return Err(invalid("缺少低位代理"));
    }
    let low = read_hex4(&mut lookahead)
        .filter(|low| (0xDC00..=0xDFFF).contains(low))
        .ok_or_else(|| invalid("无效的低位代理"))?;
    *chars = lookahead;

    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
        .ok_or_else(|| invalid("无效的代理对"))
}

fn read_hex4(chars: &mut Chars<'_>) -> Option<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok()
}
