//! 元数据定义
//!
//! 提供稳定的类型键，用于按能力（trait 对象或具体类型）检索组件

use std::any::TypeId;
use std::fmt;

/// 类型信息
///
/// `id` 用作注册表中的能力键，`name` 仅用于日志和错误信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称
    pub name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息，支持 `dyn Trait`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（去掉每一段的模块路径）
    pub fn short_name(&self) -> String {
        let mut output = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == ':' {
                segment.push(ch);
            } else {
                output.push_str(last_segment(&segment));
                segment.clear();
                output.push(ch);
            }
        }
        output.push_str(last_segment(&segment));
        output
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
