//! 配置源作为容器组件
//!
//! 配置源注册为 `dyn Configure` 的默认实现后，带 `config` 标签的字段才能被绑定。

use crate::hierarchical::HierarchicalConfigure;
use crate::memory::InMemoryConfigure;
use crate::properties::PropertiesConfigure;
use config_abstractions::Configure;
use di_abstractions::{Component, Descriptor};
use std::sync::Arc;

/// 默认配置源的组件标识
pub const CONFIGURE_IDENTITY: &str = "configure";

impl Component for PropertiesConfigure {}

impl Component for HierarchicalConfigure {}

impl Component for InMemoryConfigure {}

/// 生成把配置源注册为默认 `dyn Configure` 的描述符
pub fn configure_descriptor<C>(configure: C) -> Descriptor
where
    C: Configure + Component,
{
    Descriptor::new(configure)
        .named(CONFIGURE_IDENTITY)
        .with_order(i32::MIN)
        .with_default_capability(|c| c as Arc<dyn Configure>)
        .build()
}
