//! properties 文件配置源
//!
//! 依次加载 `<conf>/default.properties` 与 `<conf>/<env>.properties`，后者覆盖前者。
//! 值中的 `${key}` 与 `${key:default}` 在全部文件合并后展开。

use crate::location::ConfigLocation;
use config_abstractions::{coerce_scalar, Configure};
use infrastructure_common::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}:]+)(?::([^}]*))?\}").expect("占位符正则无效"));

const MAX_EXPANSION_DEPTH: usize = 8;

/// properties 文件配置源
#[derive(Debug, Clone, Default)]
pub struct PropertiesConfigure {
    name: String,
    values: BTreeMap<String, String>,
}

impl PropertiesConfigure {
    /// 创建空配置源
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// 按配置位置加载，缺失的文件会被跳过
    pub fn load(location: &ConfigLocation) -> ConfigResult<Self> {
        let mut configure = Self::new("properties");
        for stem in ["default", location.env.as_str()] {
            let path = location.file(&format!("{stem}.properties"));
            if path.is_file() {
                configure.merge_file(&path)?;
            } else {
                debug!("配置文件不存在, 跳过: {}", path.display());
            }
        }
        configure.expand_placeholders();
        info!(
            "properties 配置加载完成: 目录={}, 环境={}, 键数量={}",
            location.dir().display(),
            location.env,
            configure.values.len()
        );
        Ok(configure)
    }

    /// 从文本解析
    pub fn parse(content: &str) -> Self {
        let mut configure = Self::new("properties");
        configure.merge_str(content);
        configure.expand_placeholders();
        configure
    }

    /// 合并一个文件
    pub fn merge_file(&mut self, path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        self.merge_str(&content);
        debug!("已合并配置文件: {}", path.display());
        Ok(())
    }

    /// 合并文本内容，同名键覆盖
    pub fn merge_str(&mut self, content: &str) {
        for (key, value) in parse_lines(content) {
            self.values.insert(key, value);
        }
    }

    /// 设置单个键
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// 键数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn expand_placeholders(&mut self) {
        let snapshot = self.values.clone();
        for (key, value) in &mut self.values {
            let mut current = value.clone();
            for _ in 0..MAX_EXPANSION_DEPTH {
                if !PLACEHOLDER.is_match(&current) {
                    break;
                }
                current = PLACEHOLDER
                    .replace_all(&current, |caps: &regex::Captures<'_>| {
                        let name = caps[1].trim();
                        snapshot
                            .get(name)
                            .cloned()
                            .or_else(|| std::env::var(name).ok())
                            .or_else(|| caps.get(2).map(|m| m.as_str().to_string()))
                            .unwrap_or_else(|| {
                                warn!("配置 {} 引用了不存在的键 {}", key, name);
                                String::new()
                            })
                    })
                    .into_owned();
            }
            *value = current;
        }
    }

    fn subtree(&self, prefix: &str) -> Option<Value> {
        let prefix = format!("{prefix}.");
        let mut root = Map::new();
        let mut found = false;
        for (key, value) in self.values.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            found = true;
            insert_path(&mut root, rest, coerce_scalar(value));
        }
        found.then_some(Value::Object(root))
    }
}

impl Configure for PropertiesConfigure {
    fn get_value(&self, key: &str) -> ConfigResult<Option<Value>> {
        if let Some(value) = self.values.get(key) {
            return Ok(Some(Value::String(value.clone())));
        }
        Ok(self.subtree(key))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn insert_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

fn parse_lines(content: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut logical = String::new();

    for line in content.lines() {
        let line = if logical.is_empty() {
            line.trim_start()
        } else {
            line.trim()
        };
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);

        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
        logical.clear();
    }
    if !logical.is_empty() {
        if let Some(entry) = split_entry(&logical) {
            entries.push(entry);
        }
    }
    entries
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let separator = line.find(|c: char| c == '=' || c == ':');
    let (key, value) = match separator {
        Some(index) => (&line[..index], &line[index + 1..]),
        None => (line, ""),
    };
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unescape(value.trim())))
}

fn unescape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('r') => output.push('\r'),
            Some(other) => output.push(other),
            None => {}
        }
    }
    output
}
