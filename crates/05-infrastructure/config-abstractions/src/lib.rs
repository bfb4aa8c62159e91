//! # Configuration Abstractions
//!
//! 配置抽象层，定义容器在绑定配置字段时依赖的协作者接口。
//!
//! ## 核心接口
//!
//! - [`Configure`] - 配置源接口
//! - [`ConfigureExt`] - 带默认值的类型化读取
//! - [`decode`] / [`decode_value`] - 宽松的类型解码规则

pub mod binder;
pub mod configure;

pub use binder::*;
pub use configure::*;
