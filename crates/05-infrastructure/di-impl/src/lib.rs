//! # 依赖注入具体实现
//!
//! 提供组件容器、注册表、依赖解析与注入、生命周期编排的具体实现。
//!
//! ## 引导流程
//!
//! 1. 注册：组件以描述符形式进入 [`Registry`]
//! 2. 解析：为每个依赖请求确定来源，检测循环依赖并计算初始化顺序
//! 3. 注入：按顺序注入字段并冻结组件，随后完成延迟绑定
//! 4. 初始化、启动：按依赖顺序执行钩子；关闭时按相反顺序停止

pub mod container;
mod hooks;
mod injector;
pub mod loader;
pub mod registry;
mod resolver;

pub use container::{Container, ContainerConfig};
pub use loader::{once_load, OnceGuard};
pub use registry::{Registration, Registry};
