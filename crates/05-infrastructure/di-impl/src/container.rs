//! 组件容器
//!
//! 容器负责注册、引导（解析、注入、初始化）、启动与关闭。所有方法都只需要 `&self`，
//! 可以放在 `Arc` 中跨任务共享。

use crate::hooks::run_hook;
use crate::injector;
use crate::loader::OnceGuard;
use crate::registry::Registry;
use crate::resolver;
use dashmap::DashMap;
use di_abstractions::{Component, Descriptor};
use infrastructure_common::{
    current_trace_id, new_trace_id, with_trace_id, ComponentPhase, ContainerState, DependencyError,
    DependencyResult, InfrastructureResult, LifecycleError, LifecycleResult, LoadError, Logger,
    PhaseRecord, StopFailure, TracingLogger, TypeInfo,
};
use parking_lot::{Mutex, RwLock};
use std::any::{type_name, TypeId};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info_span, Instrument};

/// 容器配置
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// 容器名称，用于日志
    pub name: String,
    /// 初始化/启动钩子的超时，`None` 表示不限时
    pub hook_timeout: Option<Duration>,
    /// 单个停止钩子的超时
    pub stop_timeout: Option<Duration>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "lorn".to_string(),
            hook_timeout: None,
            stop_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ContainerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_hook_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hook_timeout = timeout;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stop_timeout = timeout;
        self
    }
}

type LoaderGuard = Arc<OnceGuard<Result<(), LoadError>>>;

/// 组件容器
pub struct Container {
    config: ContainerConfig,
    state: RwLock<ContainerState>,
    /// 引导开始后置位，之后拒绝注册
    sealed: AtomicBool,
    /// 引导成功后置位
    ready: AtomicBool,
    registry: RwLock<Registry>,
    loaders: DashMap<TypeId, LoaderGuard>,
    init_order: Mutex<Vec<usize>>,
    started: Mutex<Vec<usize>>,
}

impl Container {
    /// 以默认配置创建容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 以指定配置创建容器
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(ContainerState::Bootstrapping),
            sealed: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            registry: RwLock::new(Registry::new()),
            loaders: DashMap::new(),
            init_order: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 当前状态
    pub fn state(&self) -> ContainerState {
        *self.state.read()
    }

    /// 注册组件
    pub fn register(&self, descriptor: impl Into<Descriptor>) -> DependencyResult<()> {
        let descriptor = descriptor.into();
        let mut registry = self.registry.write();
        self.ensure_accepting(descriptor.identity())?;
        registry.register(descriptor)
    }

    /// 仅在标识未注册时注册，返回是否实际注册
    pub fn register_once(&self, descriptor: impl Into<Descriptor>) -> DependencyResult<bool> {
        let descriptor = descriptor.into();
        let mut registry = self.registry.write();
        self.ensure_accepting(descriptor.identity())?;
        Ok(registry.register_once(descriptor))
    }

    fn ensure_accepting(&self, identity: &str) -> DependencyResult<()> {
        let state = self.state();
        if state != ContainerState::Bootstrapping {
            return Err(DependencyError::RegistrationClosed {
                identity: identity.to_string(),
                state: state.to_string(),
            });
        }
        if self.sealed.load(Ordering::SeqCst) {
            return Err(DependencyError::RegistrationClosed {
                identity: identity.to_string(),
                state: format!("{state}(注入已开始)"),
            });
        }
        Ok(())
    }

    /// 执行加载器
    ///
    /// 同一个加载器（以函数或闭包的类型区分）在一个容器内只执行一次，并发调用方等待并共享同一结果，
    /// 失败结果同样会被缓存。加载器内不能再次调用自身。
    pub fn load<F>(&self, loader: F) -> Result<(), LoadError>
    where
        F: Fn(&Container) -> DependencyResult<()> + 'static,
    {
        let guard = Arc::clone(
            &self
                .loaders
                .entry(TypeId::of::<F>())
                .or_insert_with(|| Arc::new(OnceGuard::new())),
        );
        guard.run(|| {
            let name = type_name::<F>();
            debug!("执行加载器: {}", name);
            loader(self).map_err(|error| LoadError {
                loader: name.to_string(),
                source: Arc::new(error),
            })
        })
    }

    /// 引导容器：解析依赖、注入、初始化
    ///
    /// 任一步失败都会使容器进入 `Halted` 状态，已初始化的组件直接进入 `Stopped`。
    pub async fn bootstrap(&self) -> InfrastructureResult<()> {
        self.traced("bootstrap", self.bootstrap_inner()).await
    }

    async fn bootstrap_inner(&self) -> InfrastructureResult<()> {
        let planned = {
            let mut registry = self.registry.write();
            let state = self.state();
            if state != ContainerState::Bootstrapping || self.sealed.swap(true, Ordering::SeqCst) {
                return Err(LifecycleError::InvalidState {
                    operation: "bootstrap",
                    state: state.to_string(),
                }
                .into());
            }
            let pending = registry.take_pending();
            resolver::plan(&registry, &pending).map(|plan| (plan, pending))
        };

        let result = match planned {
            Ok((plan, pending)) => self.inject_and_initialize(&plan, pending).await,
            Err(error) => Err(error.into()),
        };
        if let Err(error) = &result {
            tracing::error!("容器 {} 引导失败: {}", self.config.name, error);
            self.release_initialized();
            *self.state.write() = ContainerState::Halted;
        }
        result
    }

    async fn inject_and_initialize(
        &self,
        plan: &resolver::Plan,
        pending: Vec<Option<Box<dyn di_abstractions::ComponentSlot>>>,
    ) -> InfrastructureResult<()> {
        tracing::info!("开始注入 {} 个组件", plan.order.len());
        injector::inject_all(&self.registry, plan, pending).await?;

        let logger = self.lifecycle_logger();
        for &index in &plan.order {
            let Some((identity, component)) = self.frozen(index) else {
                continue;
            };
            if let Some(hook) = component.as_initialize() {
                logger.debug(&format!("初始化组件: {identity}"));
                run_hook(hook.init(), self.config.hook_timeout)
                    .await
                    .map_err(|source| LifecycleError::InitFailed {
                        component: identity.clone(),
                        source,
                    })?;
            }
            self.registry.write().advance(index, ComponentPhase::Initialized);
            self.init_order.lock().push(index);
        }

        self.ready.store(true, Ordering::SeqCst);
        logger.info(&format!("容器引导完成, 共 {} 个组件", plan.order.len()));
        Ok(())
    }

    /// 按初始化顺序启动组件
    ///
    /// 某个组件启动失败时，按相反顺序停止已启动的组件，容器进入 `Halted` 状态。
    pub async fn start(&self) -> InfrastructureResult<()> {
        self.traced("start", self.start_inner()).await
    }

    async fn start_inner(&self) -> InfrastructureResult<()> {
        let state = self.state();
        if state != ContainerState::Bootstrapping || !self.ready.load(Ordering::SeqCst) {
            return Err(LifecycleError::InvalidState {
                operation: "start",
                state: state.to_string(),
            }
            .into());
        }

        let logger = self.lifecycle_logger();
        let order = self.init_order.lock().clone();
        for index in order {
            let Some((identity, component)) = self.frozen(index) else {
                continue;
            };
            let Some(active) = component.as_active() else {
                continue;
            };

            logger.info(&format!("启动组件: {identity}"));
            if let Err(source) = run_hook(active.start(), self.config.hook_timeout).await {
                logger.error(&format!("组件 {identity} 启动失败: {source}, 开始回滚"));
                let rollback = self.stop_started(&*logger).await;
                self.release_initialized();
                *self.state.write() = ContainerState::Halted;
                return Err(LifecycleError::StartFailed {
                    component: identity,
                    source,
                    rollback,
                }
                .into());
            }
            self.registry.write().advance(index, ComponentPhase::Started);
            self.started.lock().push(index);
        }

        *self.state.write() = ContainerState::Running;
        logger.info(&format!("容器 {} 已进入运行状态", self.config.name));
        Ok(())
    }

    /// 引导并启动
    pub async fn launch(&self) -> InfrastructureResult<()> {
        self.bootstrap().await?;
        self.start().await
    }

    /// 关闭容器
    ///
    /// 按启动的相反顺序停止组件，单个组件停止失败不影响其余组件，所有失败汇总返回。
    /// 重复调用不会产生任何效果。
    pub async fn shutdown(&self) -> LifecycleResult<()> {
        self.traced("shutdown", self.shutdown_inner()).await
    }

    async fn shutdown_inner(&self) -> LifecycleResult<()> {
        {
            let mut state = self.state.write();
            match *state {
                ContainerState::Halted | ContainerState::ShuttingDown => {
                    debug!("容器 {} 已经关闭, 忽略重复的关闭请求", self.config.name);
                    return Ok(());
                }
                _ => *state = ContainerState::ShuttingDown,
            }
        }

        let logger = self.lifecycle_logger();
        logger.info(&format!("开始关闭容器 {}", self.config.name));
        let failures = self.stop_started(&*logger).await;
        self.release_initialized();
        *self.state.write() = ContainerState::Halted;

        if failures.is_empty() {
            logger.info(&format!("容器 {} 已关闭", self.config.name));
            Ok(())
        } else {
            Err(LifecycleError::StopFailed { failures })
        }
    }

    async fn stop_started(&self, logger: &dyn Logger) -> Vec<StopFailure> {
        let started = self.started.lock().clone();
        let mut failures = Vec::new();
        for index in started.into_iter().rev() {
            let Some((identity, component)) = self.frozen(index) else {
                continue;
            };
            if let Some(active) = component.as_active() {
                logger.info(&format!("停止组件: {identity}"));
                if let Err(error) = run_hook(active.stop(), self.config.stop_timeout).await {
                    logger.error(&format!("组件 {identity} 停止失败: {error}"));
                    failures.push(StopFailure {
                        component: identity,
                        error,
                    });
                }
            }
            self.registry.write().advance(index, ComponentPhase::Stopped);
        }
        failures
    }

    /// 已初始化但未启动的组件直接进入终态
    fn release_initialized(&self) {
        let initialized = self.init_order.lock().clone();
        let mut registry = self.registry.write();
        for index in initialized {
            if registry.entry(index).phase() == ComponentPhase::Initialized {
                registry.advance(index, ComponentPhase::Stopped);
            }
        }
    }

    /// 获取能力 `T` 的默认实现
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        let capability = TypeInfo::of::<T>();
        let registry = self.registry.read();
        let index = registry
            .select_default(capability)?
            .ok_or_else(|| self.lookup_error(capability, "*"))?;
        self.cast_arc(&registry, index, capability)
    }

    /// 按标识获取组件的能力 `T`
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(&self, identity: &str) -> DependencyResult<Arc<T>> {
        let capability = TypeInfo::of::<T>();
        let registry = self.registry.read();
        let index = registry
            .index_of(identity)
            .ok_or_else(|| self.lookup_error(capability, &format!("{identity:?}")))?;
        let entry = registry.entry(index);
        if !entry.has_capability(capability.id) {
            return Err(DependencyError::IncompatibleType {
                component: self.config.name.clone(),
                slot: "lookup".to_string(),
                expected: capability.name.to_string(),
                found: entry.concrete().name.to_string(),
            });
        }
        self.cast_arc(&registry, index, capability)
    }

    /// 获取能力 `T` 的全部实现，按注册顺序
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self) -> Vec<Arc<T>> {
        let capability = TypeInfo::of::<T>();
        let registry = self.registry.read();
        registry
            .candidates(capability.id)
            .iter()
            .filter_map(|&index| registry.entry(index).cast(capability.id))
            .filter_map(|candidate| candidate.downcast::<Arc<T>>().ok())
            .map(|arc| *arc)
            .collect()
    }

    fn cast_arc<T: ?Sized + Send + Sync + 'static>(
        &self,
        registry: &Registry,
        index: usize,
        capability: TypeInfo,
    ) -> DependencyResult<Arc<T>> {
        let entry = registry.entry(index);
        entry
            .cast(capability.id)
            .and_then(|candidate| candidate.downcast::<Arc<T>>().ok())
            .map(|arc| *arc)
            .ok_or_else(|| self.lookup_error(capability, &format!("{:?} (尚未完成注入)", entry.identity())))
    }

    fn lookup_error(&self, capability: TypeInfo, selector: &str) -> DependencyError {
        DependencyError::UnresolvedDependency {
            component: self.config.name.clone(),
            slot: "lookup".to_string(),
            selector: format!("{selector} ({})", capability.short_name()),
        }
    }

    /// 是否已注册该标识
    pub fn contains(&self, identity: &str) -> bool {
        self.registry.read().lookup(identity).is_some()
    }

    /// 是否已有组件声明能力 `T`，引导前也可调用
    pub fn has_capability<T: ?Sized + 'static>(&self) -> bool {
        !self
            .registry
            .read()
            .candidates(TypeId::of::<T>())
            .is_empty()
    }

    /// 按注册顺序列出标识
    pub fn identities(&self) -> Vec<String> {
        self.registry
            .read()
            .iter()
            .map(|entry| entry.identity().to_string())
            .collect()
    }

    /// 组件当前阶段
    pub fn phase_of(&self, identity: &str) -> Option<ComponentPhase> {
        self.registry.read().lookup(identity).map(|entry| entry.phase())
    }

    /// 组件阶段迁移历史
    pub fn history_of(&self, identity: &str) -> Vec<PhaseRecord> {
        self.registry
            .read()
            .lookup(identity)
            .map(|entry| entry.history().to_vec())
            .unwrap_or_default()
    }

    /// 实际的初始化顺序
    pub fn initialization_order(&self) -> Vec<String> {
        self.identities_of(&self.init_order.lock())
    }

    /// 实际的启动顺序
    pub fn start_order(&self) -> Vec<String> {
        self.identities_of(&self.started.lock())
    }

    fn identities_of(&self, indices: &[usize]) -> Vec<String> {
        let registry = self.registry.read();
        indices
            .iter()
            .map(|&index| registry.entry(index).identity().to_string())
            .collect()
    }

    fn frozen(&self, index: usize) -> Option<(String, Arc<dyn Component>)> {
        let registry = self.registry.read();
        let entry = registry.entry(index);
        entry
            .component()
            .map(|component| (entry.identity().to_string(), Arc::clone(component)))
    }

    /// 生命周期日志：优先使用默认注册的 [`Logger`]
    fn lifecycle_logger(&self) -> Arc<dyn Logger> {
        self.get::<dyn Logger>()
            .unwrap_or_else(|_| Arc::new(TracingLogger))
    }

    async fn traced<F: Future>(&self, operation: &'static str, future: F) -> F::Output {
        let trace_id = current_trace_id().unwrap_or_else(new_trace_id);
        let span = info_span!(
            "container",
            name = %self.config.name,
            operation,
            trace_id = %trace_id
        );
        with_trace_id(trace_id, future.instrument(span)).await
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("components", &self.registry.read().len())
            .finish()
    }
}
