//! # Infrastructure Common
//!
//! 这个 crate 提供了容器内核各层共享的类型与协作者接口。
//!
//! ## 核心内容
//!
//! - [`errors`] - 依赖注入、生命周期、配置相关的错误类型
//! - [`TypeInfo`] - 用作能力键的稳定类型标识
//! - [`ComponentPhase`] / [`ContainerState`] - 组件阶段与容器状态机
//! - [`Initialize`] / [`Active`] - 生命周期钩子
//! - [`Logger`] / [`Tracer`] - 日志与追踪协作者

pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod metadata;
pub mod trace;

pub use errors::*;
pub use lifecycle::*;
pub use logging::*;
pub use metadata::*;
pub use trace::*;
