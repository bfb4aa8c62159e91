//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件、描述符、依赖请求与提供者。
//!
//! ## 核心接口
//!
//! - [`Component`] - 组件 trait，声明依赖并接收注入
//! - [`Descriptor`] - 组件在注册表中的记录（标识、能力、排序、覆盖标记）
//! - [`DependencyRequest`] - 字段级依赖请求
//! - [`Tag`] - 注入标签解析
//! - [`Provider`] - 按选择器即时构造值的提供者
//! - [`Late`] - 延迟绑定字段，用于打破依赖环

pub mod component;
pub mod descriptor;
pub mod late;
pub mod provider;
pub mod request;
pub mod tag;

pub use component::*;
pub use descriptor::*;
pub use late::*;
pub use provider::*;
pub use request::*;
pub use tag::*;

pub use async_trait::async_trait;
pub use infrastructure_common::{
    Active, DependencyError, DependencyResult, HookResult, Initialize, ProviderError, TypeInfo,
};

#[cfg(feature = "derive")]
pub use component_macros::Component;
