//! 宏工具函数

use syn::{Attribute, Field, LitStr, Meta, Result, Type};

/// 注入字段的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 组件依赖，注入时可变写入
    Component,
    /// 延迟绑定，冻结后通过 `Late::fill` 写入
    Late,
    /// 配置值
    Config,
}

/// 检查类型的最后一段是否为指定名称（如 `Late`、`Option`）
pub fn type_ends_with(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == name),
        _ => false,
    }
}

/// 检查字段是否有特定属性
pub fn field_has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}

/// 读取 `#[inject]` / `#[inject("tag")]` 的标签文本
///
/// 没有该属性时返回 `None`；无参数时标签为空字符串。
pub fn inject_tag(field: &Field) -> Result<Option<LitStr>> {
    let Some(attr) = find_attribute(&field.attrs, "inject") else {
        return Ok(None);
    };
    match &attr.meta {
        Meta::Path(path) => Ok(Some(LitStr::new("", path.segments[0].ident.span()))),
        Meta::List(_) => attr.parse_args::<LitStr>().map(Some),
        Meta::NameValue(nv) => Err(syn::Error::new_spanned(
            nv,
            "注入标签应写作 #[inject] 或 #[inject(\"tag\")]",
        )),
    }
}

fn find_attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

/// 标签是否为配置标签（逗号前的名称为 `config`）
pub fn is_config_tag(tag: &str) -> bool {
    tag.split(',').next().is_some_and(|name| name.trim() == "config")
}

/// 配置标签是否带有配置键
pub fn config_tag_has_key(tag: &str) -> bool {
    tag.split_once(',')
        .map(|(_, rest)| rest.split('=').next().unwrap_or("").trim())
        .is_some_and(|key| !key.is_empty())
}

/// 判断字段类别
pub fn field_kind(ty: &Type, tag: &str) -> FieldKind {
    if is_config_tag(tag) {
        FieldKind::Config
    } else if type_ends_with(ty, "Late") {
        FieldKind::Late
    } else {
        FieldKind::Component
    }
}
