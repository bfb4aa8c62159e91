//! 注入标签解析
//!
//! 语法为 `name[,option[=value]]*`：
//!
//! - `name` 为空或 `*` 表示按能力取默认实现，否则为组件标识
//! - `name` 为 `config` 时表示配置绑定，其后的 `key=default` 为配置键和默认值
//! - `optional` 表示依赖缺失时不报错
//! - 第一个逗号之后的原始文本会原样交给提供者作为选择器

use infrastructure_common::{DependencyError, DependencyResult};

/// 配置绑定标签名
pub const CONFIG_TAG: &str = "config";
/// 可选依赖标记
pub const OPTIONAL_FLAG: &str = "optional";

/// 解析后的注入标签
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    raw: String,
    name: Option<String>,
    extend: String,
    options: Vec<(String, Option<String>)>,
}

impl Tag {
    /// 解析标签文本
    pub fn parse(raw: &str) -> DependencyResult<Self> {
        let trimmed = raw.trim();
        let (name, extend) = match trimmed.split_once(',') {
            Some((name, rest)) => (name.trim(), rest.trim()),
            None => (trimmed, ""),
        };

        if name.contains(char::is_whitespace) || name.contains('=') {
            return Err(DependencyError::invalid_tag(raw, "组件名不能包含空白或 '='"));
        }

        let mut options = Vec::new();
        for part in extend.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(DependencyError::invalid_tag(raw, "选项名不能为空"));
                    }
                    options.push((key.to_string(), Some(value.trim().to_string())));
                }
                None => options.push((part.to_string(), None)),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            name: match name {
                "" | "*" => None,
                other => Some(other.to_string()),
            },
            extend: extend.to_string(),
            options,
        })
    }

    /// 原始标签文本
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 组件标识，`None` 表示取默认实现
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 第一个逗号之后的原始文本
    pub fn extend(&self) -> &str {
        &self.extend
    }

    /// 全部选项
    pub fn options(&self) -> &[(String, Option<String>)] {
        &self.options
    }

    /// 读取 `key=value` 形式的选项值
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(name, _)| name == key)
            .and_then(|(_, value)| value.as_deref())
    }

    /// 是否带有某个标记或选项
    pub fn has_flag(&self, key: &str) -> bool {
        self.options.iter().any(|(name, _)| name == key)
    }

    /// 是否为可选依赖
    pub fn is_optional(&self) -> bool {
        self.has_flag(OPTIONAL_FLAG)
    }

    /// 是否为配置绑定
    pub fn is_config(&self) -> bool {
        self.name() == Some(CONFIG_TAG)
    }

    /// 配置键及默认值
    ///
    /// 默认值取第一个 `=` 之后的全部文本，因此可以包含逗号。
    pub fn config_key(&self) -> Option<(String, Option<String>)> {
        let (key, default) = match self.extend.split_once('=') {
            Some((key, default)) => (key.trim(), Some(default.trim().to_string())),
            None => (self.extend.trim(), None),
        };
        (!key.is_empty()).then(|| (key.to_string(), default))
    }
}
