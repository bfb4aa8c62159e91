//! 容器的集成测试

use async_trait::async_trait;
use config_impl::{configure_descriptor, InMemoryConfigure};
use di_abstractions::{
    provided, Active, Candidate, Component, DependencyRequest, Descriptor, HookResult, Initialize,
    Inject, Injected, Late, ProvideRequest, Provider, ProviderCache, ProviderError, TypeInfo,
};
use di_impl::Container;
use infrastructure_common::{
    ComponentPhase, ContainerState, DependencyError, DependencyResult, HookError,
    InfrastructureError, LifecycleError, LogLevel, Logger,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT: Once = Once::new();

fn init_test_logger() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

type Journal = Arc<Mutex<Vec<String>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .iter()
        .filter_map(|entry| entry.strip_prefix(prefix).map(str::to_string))
        .collect()
}

/// 记录生命周期事件的测试组件
struct Step {
    name: &'static str,
    deps: Vec<&'static str>,
    upstream: Vec<Arc<Step>>,
    journal: Journal,
    fail_start: bool,
    fail_stop: bool,
}

impl Step {
    fn new(name: &'static str, deps: &[&'static str], journal: &Journal) -> Self {
        Self {
            name,
            deps: deps.to_vec(),
            upstream: Vec::new(),
            journal: Arc::clone(journal),
            fail_start: false,
            fail_stop: false,
        }
    }

    fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    fn descriptor(self) -> Descriptor {
        self.ordered(0)
    }

    fn ordered(self, order: i32) -> Descriptor {
        let name = self.name;
        Descriptor::new(self).named(name).with_order(order).build()
    }
}

impl Component for Step {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        self.deps
            .iter()
            .map(|dep| DependencyRequest::component::<Arc<Step>>(*dep, dep))
            .collect()
    }

    fn inject(&mut self, value: Injected) -> DependencyResult<()> {
        self.upstream.push(value.take()?);
        Ok(())
    }

    fn as_initialize(&self) -> Option<&dyn Initialize> {
        Some(self)
    }

    fn as_active(&self) -> Option<&dyn Active> {
        Some(self)
    }
}

#[async_trait]
impl Initialize for Step {
    async fn init(&self) -> HookResult {
        self.journal.lock().push(format!("init:{}", self.name));
        Ok(())
    }
}

#[async_trait]
impl Active for Step {
    async fn start(&self) -> HookResult {
        self.journal.lock().push(format!("start:{}", self.name));
        if self.fail_start {
            anyhow::bail!("{} 无法绑定端口", self.name);
        }
        Ok(())
    }

    async fn stop(&self) -> HookResult {
        self.journal.lock().push(format!("stop:{}", self.name));
        if self.fail_stop {
            anyhow::bail!("{} 停止超时", self.name);
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_lifecycle_follows_dependency_order() {
    init_test_logger();
    let journal = journal();
    let container = Container::new();
    container.register(Step::new("a", &["b"], &journal).descriptor()).unwrap();
    container.register(Step::new("b", &["c"], &journal).descriptor()).unwrap();
    container.register(Step::new("c", &[], &journal).descriptor()).unwrap();

    container.launch().await.unwrap();
    assert_eq!(container.state(), ContainerState::Running);
    assert_eq!(entries(&journal, "init:"), vec!["c", "b", "a"]);
    assert_eq!(entries(&journal, "start:"), vec!["c", "b", "a"]);
    assert_eq!(container.initialization_order(), vec!["c", "b", "a"]);

    container.shutdown().await.unwrap();
    assert_eq!(entries(&journal, "stop:"), vec!["a", "b", "c"]);
    assert_eq!(container.state(), ContainerState::Halted);
    assert_eq!(container.phase_of("a"), Some(ComponentPhase::Stopped));

    // 重复关闭不产生效果
    container.shutdown().await.unwrap();
    assert_eq!(entries(&journal, "stop:").len(), 3);
}

#[tokio::test]
async fn test_start_failure_rolls_back_in_reverse() {
    init_test_logger();
    let journal = journal();
    let container = Container::new();
    container.register(Step::new("a", &[], &journal).ordered(0)).unwrap();
    container.register(Step::new("b", &[], &journal).ordered(1)).unwrap();
    container
        .register(Step::new("c", &[], &journal).failing_start().ordered(2))
        .unwrap();
    container.register(Step::new("d", &[], &journal).ordered(3)).unwrap();

    container.bootstrap().await.unwrap();
    let error = container.start().await.unwrap_err();
    match error {
        InfrastructureError::Lifecycle(LifecycleError::StartFailed {
            component, rollback, ..
        }) => {
            assert_eq!(component, "c");
            assert!(rollback.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(entries(&journal, "start:"), vec!["a", "b", "c"]);
    assert_eq!(entries(&journal, "stop:"), vec!["b", "a"]);
    assert_eq!(container.state(), ContainerState::Halted);
    assert_eq!(container.phase_of("d"), Some(ComponentPhase::Stopped));

    container.shutdown().await.unwrap();
    assert_eq!(entries(&journal, "stop:"), vec!["b", "a"]);
}

#[tokio::test]
async fn test_stop_failures_are_aggregated() {
    init_test_logger();
    let journal = journal();
    let container = Container::new();
    container.register(Step::new("a", &[], &journal).failing_stop().descriptor()).unwrap();
    container.register(Step::new("b", &["a"], &journal).descriptor()).unwrap();
    container.register(Step::new("c", &["b"], &journal).failing_stop().descriptor()).unwrap();
    container.launch().await.unwrap();

    let error = container.shutdown().await.unwrap_err();
    match error {
        LifecycleError::StopFailed { failures } => {
            let failed: Vec<&str> = failures.iter().map(|f| f.component.as_str()).collect();
            assert_eq!(failed, vec!["c", "a"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    // 失败的组件不会阻止其余组件停止
    assert_eq!(entries(&journal, "stop:"), vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_rollback_stop_failures_are_reported() {
    init_test_logger();
    let journal = journal();
    let container = Container::new();
    container
        .register(Step::new("a", &[], &journal).failing_stop().ordered(0))
        .unwrap();
    container
        .register(Step::new("b", &[], &journal).failing_start().ordered(1))
        .unwrap();

    let error = container.launch().await.unwrap_err();
    let message = error.to_string();
    match error {
        InfrastructureError::Lifecycle(LifecycleError::StartFailed {
            component, rollback, ..
        }) => {
            assert_eq!(component, "b");
            let failed: Vec<&str> = rollback.iter().map(|f| f.component.as_str()).collect();
            assert_eq!(failed, vec!["a"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(message.contains("a 停止超时"));
    assert_eq!(entries(&journal, "stop:"), vec!["a"]);
    assert_eq!(container.phase_of("a"), Some(ComponentPhase::Stopped));
    assert_eq!(container.state(), ContainerState::Halted);
}

#[tokio::test]
async fn test_cycle_halts_bootstrap() {
    let journal = journal();
    let container = Container::new();
    container.register(Step::new("a", &["b"], &journal).descriptor()).unwrap();
    container.register(Step::new("b", &["a"], &journal).descriptor()).unwrap();

    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::CyclicDependency { ref cycle }) if cycle == &["a", "b", "a"]
    ));
    assert_eq!(container.state(), ContainerState::Halted);
    assert!(journal.lock().is_empty());
}

#[tokio::test]
async fn test_registration_closes_after_bootstrap() {
    let journal = journal();
    let container = Container::new();
    container.register(Step::new("a", &[], &journal).descriptor()).unwrap();
    container.bootstrap().await.unwrap();

    let error = container
        .register(Step::new("late", &[], &journal).descriptor())
        .unwrap_err();
    assert!(matches!(error, DependencyError::RegistrationClosed { .. }));
    assert!(!container.contains("late"));
}

trait Cache: Send + Sync {
    fn namespace(&self) -> &str;
}

struct NamedCache(&'static str);

impl Cache for NamedCache {
    fn namespace(&self) -> &str {
        self.0
    }
}

impl Component for NamedCache {}

fn cache(identity: &'static str) -> Descriptor {
    Descriptor::new(NamedCache(identity))
        .named(identity)
        .with_capability(|c| c as Arc<dyn Cache>)
        .build()
}

#[derive(Default)]
struct CacheUser {
    cache: Inject<dyn Cache>,
    all: Vec<Arc<dyn Cache>>,
}

impl Component for CacheUser {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(vec![
            DependencyRequest::component::<Inject<dyn Cache>>("cache", "")?,
            DependencyRequest::component::<Vec<Arc<dyn Cache>>>("all", "")?,
        ])
    }

    fn inject(&mut self, value: Injected) -> DependencyResult<()> {
        match value.slot().to_owned().as_str() {
            "cache" => self.cache = value.take()?,
            "all" => self.all = value.take()?,
            _ => return Err(value.unexpected()),
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_default_capability_resolution() {
    let container = Container::new();
    container.register(cache("c1")).unwrap();
    container.register(Descriptor::new(CacheUser::default()).named("user")).unwrap();
    container.bootstrap().await.unwrap();

    let user = container.get::<CacheUser>().unwrap();
    assert_eq!(user.cache.namespace(), "c1");
    assert_eq!(user.all.len(), 1);
    assert_eq!(container.get::<dyn Cache>().unwrap().namespace(), "c1");
}

#[tokio::test]
async fn test_ambiguous_default_fails_bootstrap() {
    let container = Container::new();
    container.register(cache("c1")).unwrap();
    container.register(cache("c2")).unwrap();
    container.register(Descriptor::new(CacheUser::default()).named("user")).unwrap();

    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::AmbiguousDefault { ref candidates, .. })
            if candidates == &["c1", "c2"]
    ));
}

#[tokio::test]
async fn test_explicit_default_wins_and_many_collects_all() {
    let container = Container::new();
    container.register(cache("c1")).unwrap();
    container
        .register(
            Descriptor::new(NamedCache("c2"))
                .named("c2")
                .with_default_capability(|c| c as Arc<dyn Cache>),
        )
        .unwrap();
    container.register(Descriptor::new(CacheUser::default()).named("user")).unwrap();
    container.bootstrap().await.unwrap();

    let user = container.get_named::<CacheUser>("user").unwrap();
    assert_eq!(user.cache.namespace(), "c2");
    let namespaces: Vec<&str> = user.all.iter().map(|c| c.namespace()).collect();
    assert_eq!(namespaces, vec!["c1", "c2"]);
    assert_eq!(container.get_all::<dyn Cache>().len(), 2);
}

/// 按选择器构造散列计算器的提供者
struct HasherProvider {
    memoize: bool,
    built: AtomicUsize,
    cache: ProviderCache<Hasher>,
}

struct Hasher {
    key: String,
}

impl HasherProvider {
    fn new(memoize: bool) -> Self {
        Self {
            memoize,
            built: AtomicUsize::new(0),
            cache: ProviderCache::new(),
        }
    }

    fn build(&self, key: &str) -> Arc<Hasher> {
        self.built.fetch_add(1, Ordering::SeqCst);
        Arc::new(Hasher {
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl Provider for HasherProvider {
    fn provided_types(&self) -> Vec<TypeInfo> {
        vec![TypeInfo::of::<Hasher>()]
    }

    async fn provide(&self, request: ProvideRequest<'_>) -> Result<Candidate, ProviderError> {
        if !request.wants::<Hasher>() {
            return Err(request.mismatch());
        }
        let key = request.require_key()?;
        let hasher = if self.memoize {
            self.cache
                .get_or_try_insert_with(key, || Ok::<_, ProviderError>(self.build(key)))?
        } else {
            self.build(key)
        };
        Ok(provided(hasher))
    }
}

impl Component for HasherProvider {
    fn as_provider(&self) -> Option<&dyn Provider> {
        Some(self)
    }
}

#[derive(Default)]
struct Signer {
    first: Inject<Hasher>,
    second: Inject<Hasher>,
}

impl Component for Signer {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(vec![
            DependencyRequest::component::<Inject<Hasher>>("first", ",my-key")?,
            DependencyRequest::component::<Inject<Hasher>>("second", ",my-key")?,
        ])
    }

    fn inject(&mut self, value: Injected) -> DependencyResult<()> {
        match value.slot().to_owned().as_str() {
            "first" => self.first = value.take()?,
            "second" => self.second = value.take()?,
            _ => return Err(value.unexpected()),
        }
        Ok(())
    }
}

async fn signer_with(memoize: bool) -> (Arc<Signer>, Arc<HasherProvider>) {
    let container = Container::new();
    container
        .register(Descriptor::new(HasherProvider::new(memoize)).named("hashers"))
        .unwrap();
    container.register(Descriptor::new(Signer::default())).unwrap();
    container.bootstrap().await.unwrap();
    (
        container.get::<Signer>().unwrap(),
        container.get::<HasherProvider>().unwrap(),
    )
}

#[tokio::test]
async fn test_provider_builds_per_request() {
    let (signer, provider) = signer_with(false).await;
    assert_eq!(signer.first.key, "my-key");
    assert!(!Arc::ptr_eq(signer.first.get().unwrap(), signer.second.get().unwrap()));
    assert_eq!(provider.built.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_memoizing_provider_shares_instance() {
    let (signer, provider) = signer_with(true).await;
    assert!(Arc::ptr_eq(signer.first.get().unwrap(), signer.second.get().unwrap()));
    assert_eq!(provider.built.load(Ordering::SeqCst), 1);
}

#[derive(Default)]
struct KeylessSigner {
    hasher: Inject<Hasher>,
}

impl Component for KeylessSigner {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(vec![DependencyRequest::component::<Inject<Hasher>>("hasher", "")?])
    }

    fn inject(&mut self, value: Injected) -> DependencyResult<()> {
        self.hasher = value.take()?;
        Ok(())
    }
}

#[tokio::test]
async fn test_provider_rejects_empty_selector() {
    let container = Container::new();
    container.register(Descriptor::new(HasherProvider::new(false))).unwrap();
    container.register(Descriptor::new(KeylessSigner::default())).unwrap();
    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::ProviderNeedsKey { .. })
    ));
}

/// 以指定标签请求 `Hasher` 的组件
struct HasherUser {
    tag: &'static str,
    hasher: Inject<Hasher>,
}

impl HasherUser {
    fn tagged(tag: &'static str) -> Self {
        Self {
            tag,
            hasher: Inject::default(),
        }
    }
}

impl Component for HasherUser {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(vec![DependencyRequest::component::<Inject<Hasher>>("hasher", self.tag)?])
    }

    fn inject(&mut self, value: Injected) -> DependencyResult<()> {
        self.hasher = value.take()?;
        Ok(())
    }
}

#[tokio::test]
async fn test_identity_without_capability_is_incompatible() {
    let container = Container::new();
    container.register(cache("c1")).unwrap();
    container
        .register(Descriptor::new(HasherUser::tagged("c1")).named("user"))
        .unwrap();

    let error = container.bootstrap().await.unwrap_err();
    match error {
        InfrastructureError::Dependency(DependencyError::IncompatibleType {
            component,
            slot,
            found,
            ..
        }) => {
            assert_eq!(component, "user");
            assert_eq!(slot, "hasher");
            assert!(found.contains("NamedCache"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(container.state(), ContainerState::Halted);
}

/// 声明提供 `Hasher` 却返回其他类型的提供者
struct MislabeledProvider;

#[async_trait]
impl Provider for MislabeledProvider {
    fn provided_types(&self) -> Vec<TypeInfo> {
        vec![TypeInfo::of::<Hasher>()]
    }

    async fn provide(&self, request: ProvideRequest<'_>) -> Result<Candidate, ProviderError> {
        Ok(provided(Arc::new(request.selector().to_string())))
    }
}

impl Component for MislabeledProvider {
    fn as_provider(&self) -> Option<&dyn Provider> {
        Some(self)
    }
}

#[tokio::test]
async fn test_provider_returning_wrong_type_is_rejected() {
    let container = Container::new();
    container
        .register(Descriptor::new(MislabeledProvider).named("mislabeled"))
        .unwrap();
    container
        .register(Descriptor::new(HasherUser::tagged(",my-key")).named("user"))
        .unwrap();

    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::ProviderTypeMismatch { ref provider, ref component, .. })
            if provider == "mislabeled" && component == "user"
    ));
}

/// 构造时 panic 的提供者
struct PanickingProvider;

#[async_trait]
impl Provider for PanickingProvider {
    fn provided_types(&self) -> Vec<TypeInfo> {
        vec![TypeInfo::of::<Hasher>()]
    }

    async fn provide(&self, request: ProvideRequest<'_>) -> Result<Candidate, ProviderError> {
        if request.selector().is_empty() {
            return Err(request.mismatch());
        }
        panic!("散列种子缺失: {}", request.selector())
    }
}

impl Component for PanickingProvider {
    fn as_provider(&self) -> Option<&dyn Provider> {
        Some(self)
    }
}

#[tokio::test]
async fn test_provider_panic_halts_bootstrap() {
    let container = Container::new();
    container
        .register(Descriptor::new(PanickingProvider).named("seeds"))
        .unwrap();
    container
        .register(Descriptor::new(HasherUser::tagged(",my-key")).named("user"))
        .unwrap();

    let error = container.bootstrap().await.unwrap_err();
    match error {
        InfrastructureError::Dependency(DependencyError::ProviderFailed {
            provider,
            source: ProviderError::Panicked { message, backtrace },
            ..
        }) => {
            assert_eq!(provider, "seeds");
            assert_eq!(message, "散列种子缺失: my-key");
            assert!(!backtrace.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(container.state(), ContainerState::Halted);
}

/// 延迟绑定提供者构造值的组件
#[derive(Default)]
struct LateHasherUser {
    hasher: Late<Hasher>,
}

impl Component for LateHasherUser {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(vec![DependencyRequest::component::<Late<Hasher>>("hasher", ",my-key")?])
    }

    fn inject_late(&self, value: Injected) -> DependencyResult<()> {
        self.hasher.fill(value)
    }
}

#[tokio::test]
async fn test_late_binding_to_provider_is_rejected() {
    let container = Container::new();
    container
        .register(Descriptor::new(HasherProvider::new(true)).named("hashers"))
        .unwrap();
    container
        .register(Descriptor::new(LateHasherUser::default()).named("late-user"))
        .unwrap();

    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::IncompatibleType { ref component, ref found, .. })
            if component == "late-user" && found.contains("hashers")
    ));
    assert_eq!(container.state(), ContainerState::Halted);
}

#[derive(Default)]
struct Server {
    port: u16,
    timeout: Duration,
    hosts: Vec<String>,
}

impl Component for Server {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(vec![
            DependencyRequest::config::<u16>("port", "config,server.port=8080")?,
            DependencyRequest::config::<Duration>("timeout", "config,server.timeout=5s")?,
            DependencyRequest::config::<Vec<String>>("hosts", "config,server.hosts")?,
        ])
    }

    fn inject(&mut self, value: Injected) -> DependencyResult<()> {
        match value.slot().to_owned().as_str() {
            "port" => self.port = value.take()?,
            "timeout" => self.timeout = value.take()?,
            "hosts" => self.hosts = value.take()?,
            _ => return Err(value.unexpected()),
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_config_fields_are_bound() {
    let container = Container::new();
    container
        .register(configure_descriptor(
            InMemoryConfigure::new()
                .with("server.port", 9090)
                .with("server.hosts", "a.local,b.local"),
        ))
        .unwrap();
    container.register(Descriptor::new(Server::default())).unwrap();
    container.bootstrap().await.unwrap();

    let server = container.get::<Server>().unwrap();
    assert_eq!(server.port, 9090);
    assert_eq!(server.timeout, Duration::from_secs(5));
    assert_eq!(server.hosts, vec!["a.local", "b.local"]);
}

#[tokio::test]
async fn test_config_binding_error_names_slot() {
    let container = Container::new();
    container
        .register(configure_descriptor(
            InMemoryConfigure::new().with("server.port", "not-a-port"),
        ))
        .unwrap();
    container.register(Descriptor::new(Server::default())).unwrap();
    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::ConfigBinding { ref slot, .. }) if slot == "port"
    ));
}

/// 通过延迟绑定互相引用的组件
#[derive(Default)]
struct Peer {
    other: Late<Peer>,
    target: &'static str,
}

impl Component for Peer {
    fn dependencies(&self) -> DependencyResult<Vec<DependencyRequest>> {
        Ok(vec![DependencyRequest::component::<Late<Peer>>("other", self.target)?])
    }

    fn inject_late(&self, value: Injected) -> DependencyResult<()> {
        self.other.fill(value)
    }
}

#[tokio::test]
async fn test_late_binding_breaks_cycles() {
    let container = Container::new();
    container
        .register(Descriptor::new(Peer { target: "pong", ..Peer::default() }).named("ping"))
        .unwrap();
    container
        .register(Descriptor::new(Peer { target: "ping", ..Peer::default() }).named("pong"))
        .unwrap();
    container.bootstrap().await.unwrap();

    let ping = container.get_named::<Peer>("ping").unwrap();
    let pong = container.get_named::<Peer>("pong").unwrap();
    assert!(Arc::ptr_eq(&ping.other.get().unwrap(), &pong));
    assert!(Arc::ptr_eq(&pong.other.get().unwrap(), &ping));
}

struct Panicky;

impl Component for Panicky {
    fn as_initialize(&self) -> Option<&dyn Initialize> {
        Some(self)
    }
}

#[async_trait]
impl Initialize for Panicky {
    async fn init(&self) -> HookResult {
        let pool: Vec<u8> = Vec::new();
        if pool.is_empty() {
            panic!("连接池为空");
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_init_panic_is_reported() {
    let container = Container::new();
    container.register(Descriptor::new(Panicky).named("panicky")).unwrap();
    let error = container.bootstrap().await.unwrap_err();
    match error {
        InfrastructureError::Lifecycle(LifecycleError::InitFailed { component, source }) => {
            assert_eq!(component, "panicky");
            assert!(matches!(source, HookError::Panicked { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(container.state(), ContainerState::Halted);
}

#[tokio::test]
async fn test_init_failure_releases_initialized_components() {
    let journal = journal();
    let container = Container::new();
    container
        .register(Step::new("a", &[], &journal).ordered(-1))
        .unwrap();
    container.register(Descriptor::new(Panicky).named("panicky")).unwrap();

    assert!(container.bootstrap().await.is_err());
    assert_eq!(entries(&journal, "init:"), vec!["a"]);
    assert_eq!(container.phase_of("a"), Some(ComponentPhase::Stopped));
    assert_eq!(container.phase_of("panicky"), Some(ComponentPhase::Injected));
    assert!(entries(&journal, "stop:").is_empty());
    assert_eq!(container.state(), ContainerState::Halted);
}

#[derive(Default)]
struct RecordingLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}

impl Component for RecordingLogger {}

#[tokio::test]
async fn test_registered_logger_receives_lifecycle_events() {
    let journal = journal();
    let container = Container::new();
    container
        .register(
            Descriptor::new(RecordingLogger::default())
                .named("logger")
                .with_default_capability(|l| l as Arc<dyn Logger>),
        )
        .unwrap();
    container.register(Step::new("a", &[], &journal).descriptor()).unwrap();
    container.launch().await.unwrap();
    container.shutdown().await.unwrap();

    let logger = container.get::<RecordingLogger>().unwrap();
    let lines = logger.lines.lock();
    assert!(lines.iter().any(|(_, line)| line.contains("启动组件: a")));
    assert!(lines.iter().any(|(_, line)| line.contains("停止组件: a")));
}

#[test]
fn test_loader_runs_once_across_threads() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn load_caches(container: &Container) -> DependencyResult<()> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        container.register(cache("c1"))
    }

    let container = Arc::new(Container::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let container = Arc::clone(&container);
            std::thread::spawn(move || container.load(load_caches))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(container.identities(), vec!["c1"]);
}

#[test]
fn test_loader_failure_is_shared() {
    fn duplicate(container: &Container) -> DependencyResult<()> {
        container.register(cache("c1"))
    }

    let container = Container::new();
    container.register(cache("c1")).unwrap();
    let first = container.load(duplicate).unwrap_err();
    let second = container.load(duplicate).unwrap_err();
    assert!(first.loader.contains("duplicate"));
    assert!(matches!(*first.source, DependencyError::DuplicateIdentity { .. }));
    assert!(Arc::ptr_eq(&first.source, &second.source));
}
