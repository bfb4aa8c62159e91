//! 内置协作者的加载器
//!
//! 每个加载器在一个容器内只执行一次；若使用方已注册同类能力则不再注册默认实现。

use config_abstractions::Configure;
use config_impl::{configure_descriptor, ConfigLocation, HierarchicalConfigure, PropertiesConfigure};
use di_abstractions::Descriptor;
use di_impl::Container;
use infrastructure_common::{
    DefaultTracer, DependencyResult, InfrastructureResult, Logger, Tracer, TracingLogger,
};
use std::sync::Arc;
use tracing::debug;

/// 默认日志组件标识
pub const LOGGER_IDENTITY: &str = "logger";
/// 默认追踪组件标识
pub const TRACER_IDENTITY: &str = "tracer";

/// 配置源后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigBackend {
    /// `.properties` 扁平键值文件
    #[default]
    Properties,
    /// `config` crate 的分层配置（TOML/YAML/JSON + 环境变量）
    Hierarchical,
}

/// 注册默认日志协作者
pub fn load_logger(container: &Container) -> DependencyResult<()> {
    if container.has_capability::<dyn Logger>() {
        debug!("已存在 Logger 实现, 跳过默认日志组件");
        return Ok(());
    }
    container
        .register_once(
            Descriptor::new(TracingLogger)
                .named(LOGGER_IDENTITY)
                .with_order(i32::MIN)
                .with_default_capability(|logger| logger as Arc<dyn Logger>),
        )
        .map(|_| ())
}

/// 注册默认追踪协作者
pub fn load_tracer(container: &Container) -> DependencyResult<()> {
    if container.has_capability::<dyn Tracer>() {
        debug!("已存在 Tracer 实现, 跳过默认追踪组件");
        return Ok(());
    }
    container
        .register_once(
            Descriptor::new(DefaultTracer)
                .named(TRACER_IDENTITY)
                .with_order(i32::MIN)
                .with_default_capability(|tracer| tracer as Arc<dyn Tracer>),
        )
        .map(|_| ())
}

/// 按配置位置读取配置源并注册为默认 `dyn Configure`
///
/// 读取失败返回配置错误，注册被拒绝时返回依赖错误；容器中已有配置源时不会读取文件。
pub fn load_configure(
    container: &Container,
    location: &ConfigLocation,
    backend: ConfigBackend,
) -> InfrastructureResult<bool> {
    if container.has_capability::<dyn Configure>() {
        debug!("已存在 Configure 实现, 跳过配置文件加载");
        return Ok(false);
    }
    let descriptor = match backend {
        ConfigBackend::Properties => configure_descriptor(PropertiesConfigure::load(location)?),
        ConfigBackend::Hierarchical => configure_descriptor(HierarchicalConfigure::load(location)?),
    };
    Ok(container.register_once(descriptor)?)
}
