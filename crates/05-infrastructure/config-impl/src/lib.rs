//! # Configuration Implementation
//!
//! 配置源的具体实现。
//!
//! ## 主要组件
//!
//! - [`ConfigLocation`] - 从命令行/环境变量确定运行环境与配置目录
//! - [`PropertiesConfigure`] - `.properties` 扁平键值配置，支持 `${key:default}` 展开
//! - [`HierarchicalConfigure`] - 基于 `config` crate 的分层配置（文件 + 环境变量）
//! - [`InMemoryConfigure`] - 内存配置，主要用于测试
//! - [`configure_descriptor`] - 将配置源注册为容器的默认 `dyn Configure`

pub mod components;
pub mod hierarchical;
pub mod location;
pub mod memory;
pub mod properties;

pub use components::*;
pub use hierarchical::*;
pub use location::*;
pub use memory::*;
pub use properties::*;
