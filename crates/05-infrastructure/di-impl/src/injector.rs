//! 依赖注入执行
//!
//! 按计划顺序逐个注入并冻结组件，随后进行延迟绑定的第二轮注入。
//! 提供者调用是异步的，期间不持有注册表锁。

use crate::hooks::{catch_panic, CaughtPanic};
use crate::registry::Registry;
use crate::resolver::{Plan, PlannedRequest, Source};
use config_abstractions::Configure;
use di_abstractions::{Candidate, ComponentSlot, DependencyRequest, Injected, ProvideRequest};
use infrastructure_common::{ComponentPhase, DependencyError, DependencyResult, ProviderError, TypeInfo};
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// 执行注入
pub(crate) async fn inject_all(
    registry: &RwLock<Registry>,
    plan: &Plan,
    mut pending: Vec<Option<Box<dyn ComponentSlot>>>,
) -> DependencyResult<()> {
    for &index in &plan.order {
        let Some(mut slot) = pending.get_mut(index).and_then(Option::take) else {
            continue;
        };
        let owner = registry.read().entry(index).identity().to_string();

        for planned in &plan.requests[index] {
            if planned.request.is_late() {
                continue;
            }
            if let Some(value) = produce(registry, &owner, planned).await? {
                slot.component_mut().inject(value)?;
            }
        }

        let frozen = slot.freeze();
        {
            let mut registry = registry.write();
            registry.freeze(index, frozen);
            registry.advance(index, ComponentPhase::Injected);
        }
        debug!("组件注入完成: {}", owner);
    }

    for &index in &plan.order {
        let late: Vec<&PlannedRequest> = plan.requests[index]
            .iter()
            .filter(|planned| planned.request.is_late())
            .collect();
        if late.is_empty() {
            continue;
        }

        let (owner, component) = {
            let registry = registry.read();
            let entry = registry.entry(index);
            (entry.identity().to_string(), entry.component().cloned())
        };
        let Some(component) = component else {
            continue;
        };
        for planned in late {
            if let Some(value) = produce(registry, &owner, planned).await? {
                component.inject_late(value)?;
                debug!("延迟绑定完成: {}.{}", owner, planned.request.slot());
            }
        }
    }
    Ok(())
}

/// 为单个请求生成注入值，可选依赖缺失时返回 `None`
async fn produce(
    registry: &RwLock<Registry>,
    owner: &str,
    planned: &PlannedRequest,
) -> DependencyResult<Option<Injected>> {
    let request = &planned.request;
    let value = match &planned.source {
        Source::Absent => return Ok(None),
        Source::Static(indices) => {
            let candidates = {
                let registry = registry.read();
                indices
                    .iter()
                    .map(|&index| cast(&registry, index, request.target(), owner, request))
                    .collect::<DependencyResult<Vec<_>>>()?
            };
            request
                .assemble(candidates)
                .ok_or_else(|| incompatible(owner, request, request.target().name))?
        }
        Source::Provider(index) => provide(registry, *index, owner, request).await?,
        Source::Config(index) => {
            let configure = {
                let registry = registry.read();
                cast(&registry, *index, TypeInfo::of::<dyn Configure>(), owner, request)?
            };
            let configure = configure
                .downcast::<Arc<dyn Configure>>()
                .map_err(|_| incompatible(owner, request, "dyn Configure"))?;
            request
                .decode_config(&**configure)
                .map_err(|source| DependencyError::ConfigBinding {
                    component: owner.to_string(),
                    slot: request.slot().to_string(),
                    source,
                })?
                .ok_or_else(|| incompatible(owner, request, request.value_type()))?
        }
    };
    Ok(Some(Injected::new(owner, request.slot(), request.value_type(), value)))
}

fn cast(
    registry: &Registry,
    index: usize,
    capability: TypeInfo,
    owner: &str,
    request: &DependencyRequest,
) -> DependencyResult<Candidate> {
    let entry = registry.entry(index);
    if !entry.is_frozen() {
        return Err(DependencyError::UnresolvedDependency {
            component: owner.to_string(),
            slot: request.slot().to_string(),
            selector: format!("{} (尚未完成注入)", entry.identity()),
        });
    }
    entry
        .cast(capability.id)
        .ok_or_else(|| incompatible(owner, request, entry.concrete().name))
}

async fn provide(
    registry: &RwLock<Registry>,
    index: usize,
    owner: &str,
    request: &DependencyRequest,
) -> DependencyResult<Box<dyn Any + Send>> {
    let (provider_identity, component) = {
        let registry = registry.read();
        let entry = registry.entry(index);
        (entry.identity().to_string(), entry.component().cloned())
    };
    let mismatch = || DependencyError::ProviderTypeMismatch {
        provider: provider_identity.clone(),
        component: owner.to_string(),
        requested: request.target().name.to_string(),
    };
    let Some(component) = component else {
        return Err(DependencyError::UnresolvedDependency {
            component: owner.to_string(),
            slot: request.slot().to_string(),
            selector: format!("{provider_identity} (尚未完成注入)"),
        });
    };
    let provider = component.as_provider().ok_or_else(mismatch)?;

    debug!(
        "调用提供者 {} 为 {}.{} 构造 {}",
        provider_identity,
        owner,
        request.slot(),
        request.target().short_name()
    );
    let provided = catch_panic(provider.provide(ProvideRequest {
        requester: owner,
        slot: request.slot(),
        target: request.target(),
        tag: request.tag(),
    }))
    .await
    .unwrap_or_else(|CaughtPanic { message, backtrace }| {
        Err(ProviderError::Panicked { message, backtrace })
    });
    let candidate = provided.map_err(|error| match error {
        ProviderError::TypeMismatch { requested } => DependencyError::ProviderTypeMismatch {
            provider: provider_identity.clone(),
            component: owner.to_string(),
            requested,
        },
        ProviderError::NeedsKey { requested } => DependencyError::ProviderNeedsKey {
            provider: provider_identity.clone(),
            component: owner.to_string(),
            requested,
        },
        source => DependencyError::ProviderFailed {
            provider: provider_identity.clone(),
            component: owner.to_string(),
            source,
        },
    })?;

    request.assemble(vec![candidate]).ok_or_else(mismatch)
}

fn incompatible(owner: &str, request: &DependencyRequest, found: &str) -> DependencyError {
    DependencyError::IncompatibleType {
        component: owner.to_string(),
        slot: request.slot().to_string(),
        expected: request.target().name.to_string(),
        found: found.to_string(),
    }
}
