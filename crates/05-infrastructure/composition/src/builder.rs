//! 应用构建器

use crate::application::Application;
use crate::logging::LoggingConfig;
use crate::loaders::{self, ConfigBackend};
use config_abstractions::Configure;
use config_impl::{configure_descriptor, ConfigLocation};
use di_abstractions::{Component, Descriptor};
use di_impl::{Container, ContainerConfig};
use infrastructure_common::{DependencyResult, InfrastructureResult, LoadError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

type PendingLoad = Box<dyn FnOnce(&Container) -> Result<(), LoadError>>;

/// 应用构建器
///
/// 使用建造者模式组装容器：配置源、组件描述符、加载器，以及日志初始化。
pub struct ApplicationBuilder {
    /// 容器配置
    container_config: ContainerConfig,
    /// 配置文件位置
    config_location: Option<ConfigLocation>,
    /// 配置源后端
    config_backend: ConfigBackend,
    /// 显式指定的配置源
    configure: Option<Descriptor>,
    /// 待注册的组件
    descriptors: Vec<Descriptor>,
    /// 待执行的加载器
    loads: Vec<PendingLoad>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ApplicationBuilder {
    /// 创建新的应用构建器
    pub fn new() -> Self {
        Self {
            container_config: ContainerConfig::default(),
            config_location: None,
            config_backend: ConfigBackend::default(),
            configure: None,
            descriptors: Vec::new(),
            loads: Vec::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 设置容器名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.container_config = self.container_config.with_name(name);
        self
    }

    /// 设置容器配置
    pub fn with_container_config(mut self, config: ContainerConfig) -> Self {
        self.container_config = config;
        self
    }

    /// 设置初始化/启动钩子超时
    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.container_config = self.container_config.with_hook_timeout(Some(timeout));
        self
    }

    /// 设置停止钩子超时
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.container_config = self.container_config.with_stop_timeout(Some(timeout));
        self
    }

    /// 指定配置文件位置
    pub fn with_config_location(mut self, location: ConfigLocation) -> Self {
        info!(
            "使用配置位置: 目录={}, 环境={}",
            location.dir().display(),
            location.env
        );
        self.config_location = Some(location);
        self
    }

    /// 从进程参数与环境变量确定配置位置
    pub fn with_config_from_args(self) -> Self {
        self.with_config_location(ConfigLocation::from_args())
    }

    /// 选择配置源后端
    pub fn with_config_backend(mut self, backend: ConfigBackend) -> Self {
        self.config_backend = backend;
        self
    }

    /// 直接指定配置源，优先于配置文件
    pub fn with_configure<C>(mut self, configure: C) -> Self
    where
        C: Configure + Component,
    {
        info!("添加自定义配置源: {}", configure.name());
        self.configure = Some(configure_descriptor(configure));
        self
    }

    /// 注册组件
    pub fn register(mut self, descriptor: impl Into<Descriptor>) -> Self {
        let descriptor = descriptor.into();
        debug!("添加组件: {}", descriptor.identity());
        self.descriptors.push(descriptor);
        self
    }

    /// 添加加载器，构建时按添加顺序执行
    pub fn load<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Container) -> DependencyResult<()> + 'static,
    {
        self.loads
            .push(Box::new(move |container: &Container| container.load(loader)));
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 构建应用
    ///
    /// 注册顺序：显式组件、加载器、配置源、默认日志与追踪。默认协作者只在
    /// 使用方没有提供同类能力时注册。
    pub fn build(self) -> InfrastructureResult<Application> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.logging_config.initialize()?;
        }
        info!("开始构建应用: {}", self.container_config.name);

        let container = Container::with_config(self.container_config);
        for descriptor in self.descriptors {
            container.register(descriptor)?;
        }
        for load in self.loads {
            load(&container)?;
        }

        if let Some(configure) = self.configure {
            container.register(configure)?;
        } else if let Some(location) = &self.config_location {
            loaders::load_configure(&container, location, self.config_backend)?;
        }
        container.load(loaders::load_logger)?;
        container.load(loaders::load_tracer)?;

        info!("应用构建完成, 共 {} 个组件", container.identities().len());
        Ok(Application::new(Arc::new(container)))
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
