//! `#[derive(Component)]` 端到端测试：派生出的组件在真实容器中完成注入与生命周期

use async_trait::async_trait;
use config_impl::{configure_descriptor, InMemoryConfigure};
use di_abstractions::{
    provided, Active, Candidate, Component, Descriptor, HookResult, Initialize, Inject, Late,
    ProvideRequest, Provider, ProviderCache, ProviderError, TypeInfo,
};
use di_impl::Container;
use infrastructure_common::{ComponentPhase, DependencyError, InfrastructureError};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

trait Cache: Send + Sync {
    fn namespace(&self) -> &str;
}

#[derive(Component)]
struct MemoryCache {
    namespace: &'static str,
}

impl Cache for MemoryCache {
    fn namespace(&self) -> &str {
        self.namespace
    }
}

fn cache(identity: &'static str, default: bool) -> Descriptor {
    let builder = Descriptor::new(MemoryCache { namespace: identity }).named(identity);
    if default {
        builder.with_default_capability(|c| c as Arc<dyn Cache>).build()
    } else {
        builder.with_capability(|c| c as Arc<dyn Cache>).build()
    }
}

#[derive(Component, Default)]
struct Catalog {
    #[inject]
    cache: Inject<dyn Cache>,
    #[inject("c1")]
    primary: Option<Arc<dyn Cache>>,
    #[inject("missing,optional")]
    fallback: Option<Arc<dyn Cache>>,
    #[inject]
    all: Vec<Arc<dyn Cache>>,
    untouched: usize,
}

#[tokio::test]
async fn test_derived_injection_by_default_and_identity() {
    let container = Container::new();
    container.register(cache("c1", true)).unwrap();
    container.register(cache("c2", false)).unwrap();
    container
        .register(Descriptor::new(Catalog::default()).named("catalog"))
        .unwrap();
    container.bootstrap().await.unwrap();

    let catalog = container.get::<Catalog>().unwrap();
    assert_eq!(catalog.cache.namespace(), "c1");
    assert_eq!(catalog.primary.as_ref().unwrap().namespace(), "c1");
    assert!(catalog.fallback.is_none());
    assert_eq!(catalog.all.len(), 2);
    assert_eq!(catalog.untouched, 0);
}

#[tokio::test]
async fn test_derived_injection_reports_ambiguity() {
    let container = Container::new();
    container.register(cache("c1", false)).unwrap();
    container.register(cache("c2", false)).unwrap();
    container
        .register(Descriptor::new(Catalog::default()).named("catalog"))
        .unwrap();

    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::AmbiguousDefault { .. })
    ));
}

#[derive(Debug, Deserialize, PartialEq)]
struct PoolSettings {
    size: u32,
    name: String,
}

#[derive(Component)]
struct Database {
    #[inject("config,db.url")]
    url: String,
    #[inject("config,db.timeout=3s")]
    timeout: Duration,
    #[inject("config,db.pool")]
    pool: Option<PoolSettings>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::ZERO,
            pool: None,
        }
    }
}

#[tokio::test]
async fn test_derived_config_fields() {
    let container = Container::new();
    container
        .register(configure_descriptor(
            InMemoryConfigure::new()
                .with("db.url", "postgres://localhost/app")
                .with("db.pool.size", 8)
                .with("db.pool.name", "main"),
        ))
        .unwrap();
    container
        .register(Descriptor::new(Database::default()).named("database"))
        .unwrap();
    container.bootstrap().await.unwrap();

    let database = container.get::<Database>().unwrap();
    assert_eq!(database.url, "postgres://localhost/app");
    assert_eq!(database.timeout, Duration::from_secs(3));
    assert_eq!(
        database.pool,
        Some(PoolSettings {
            size: 8,
            name: "main".to_string(),
        })
    );
}

#[tokio::test]
async fn test_missing_config_key_fails_bootstrap() {
    let container = Container::new();
    container
        .register(configure_descriptor(InMemoryConfigure::new()))
        .unwrap();
    container
        .register(Descriptor::new(Database::default()).named("database"))
        .unwrap();

    assert!(container.bootstrap().await.is_err());
    assert!(container.get::<Database>().is_err());
}

type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Component)]
#[component(init, active)]
struct Listener {
    journal: Journal,
    #[inject("store")]
    store: Inject<Store>,
}

#[derive(Component)]
#[component(init, active)]
struct Store {
    journal: Journal,
}

#[async_trait]
impl Initialize for Listener {
    async fn init(&self) -> HookResult {
        self.journal.lock().push("init listener".to_string());
        Ok(())
    }
}

#[async_trait]
impl Active for Listener {
    async fn start(&self) -> HookResult {
        self.journal.lock().push("start listener".to_string());
        Ok(())
    }

    async fn stop(&self) -> HookResult {
        self.journal.lock().push("stop listener".to_string());
        Ok(())
    }
}

#[async_trait]
impl Initialize for Store {
    async fn init(&self) -> HookResult {
        self.journal.lock().push("init store".to_string());
        Ok(())
    }
}

#[async_trait]
impl Active for Store {
    async fn start(&self) -> HookResult {
        self.journal.lock().push("start store".to_string());
        Ok(())
    }

    async fn stop(&self) -> HookResult {
        self.journal.lock().push("stop store".to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_derived_lifecycle_hooks_follow_dependencies() {
    let journal = Journal::default();
    let container = Container::new();
    container
        .register(
            Descriptor::new(Listener {
                journal: journal.clone(),
                store: Inject::default(),
            })
            .named("listener"),
        )
        .unwrap();
    container
        .register(
            Descriptor::new(Store {
                journal: journal.clone(),
            })
            .named("store"),
        )
        .unwrap();

    container.launch().await.unwrap();
    container.shutdown().await.unwrap();

    assert_eq!(
        *journal.lock(),
        vec![
            "init store",
            "init listener",
            "start store",
            "start listener",
            "stop listener",
            "stop store",
        ]
    );
    assert_eq!(container.phase_of("store"), Some(ComponentPhase::Stopped));
}

struct Token {
    scope: String,
}

#[derive(Component, Default)]
#[component(provider)]
struct TokenIssuer {
    tokens: ProviderCache<Token>,
}

#[async_trait]
impl Provider for TokenIssuer {
    fn provided_types(&self) -> Vec<TypeInfo> {
        vec![TypeInfo::of::<Token>()]
    }

    async fn provide(&self, request: ProvideRequest<'_>) -> Result<Candidate, ProviderError> {
        if !request.wants::<Token>() {
            return Err(request.mismatch());
        }
        let scope = request.require_key()?;
        let token = self.tokens.get_or_try_insert_with(scope, || {
            Ok::<_, ProviderError>(Arc::new(Token {
                scope: scope.to_string(),
            }))
        })?;
        Ok(provided(token))
    }
}

#[derive(Component, Default)]
struct Gateway {
    #[inject(",admin")]
    admin: Inject<Token>,
    #[inject("issuer,admin")]
    again: Inject<Token>,
}

#[tokio::test]
async fn test_derived_provider_serves_keyed_requests() {
    let container = Container::new();
    container
        .register(Descriptor::new(TokenIssuer::default()).named("issuer"))
        .unwrap();
    container
        .register(Descriptor::new(Gateway::default()).named("gateway"))
        .unwrap();
    container.bootstrap().await.unwrap();

    let gateway = container.get::<Gateway>().unwrap();
    assert_eq!(gateway.admin.scope, "admin");
    assert!(Arc::ptr_eq(
        gateway.admin.get().unwrap(),
        gateway.again.get().unwrap()
    ));
}

#[derive(Component, Default)]
struct Ping {
    #[inject("pong")]
    pong: Late<Pong>,
}

#[derive(Component, Default)]
struct Pong {
    #[inject("ping")]
    ping: Late<Ping>,
}

#[tokio::test]
async fn test_derived_late_fields_break_cycles() {
    let container = Container::new();
    container
        .register(Descriptor::new(Ping::default()).named("ping"))
        .unwrap();
    container
        .register(Descriptor::new(Pong::default()).named("pong"))
        .unwrap();
    container.bootstrap().await.unwrap();

    let ping = container.get::<Ping>().unwrap();
    let pong = container.get::<Pong>().unwrap();
    assert!(Arc::ptr_eq(&ping.pong.get().unwrap(), &pong));
    assert!(Arc::ptr_eq(&pong.ping.get().unwrap(), &ping));
}

#[derive(Component, Default)]
struct Cyclic {
    #[inject("cyclic")]
    me: Inject<Cyclic>,
}

#[tokio::test]
async fn test_derived_self_dependency_is_a_cycle() {
    let container = Container::new();
    container
        .register(Descriptor::new(Cyclic::default()).named("cyclic"))
        .unwrap();

    let error = container.bootstrap().await.unwrap_err();
    assert!(matches!(
        error,
        InfrastructureError::Dependency(DependencyError::CyclicDependency { ref cycle })
            if cycle == &["cyclic", "cyclic"]
    ));
}
