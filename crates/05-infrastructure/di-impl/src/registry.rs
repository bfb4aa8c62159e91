//! 组件注册表
//!
//! 按注册顺序保存描述符，并维护标识索引与能力索引。注册表本身不含行为，
//! 只负责唯一性、覆盖策略以及标识/能力查询。

use chrono::Utc;
use di_abstractions::{Candidate, Capability, ComponentSlot, Descriptor, FrozenComponent, Selector};
use di_abstractions::Component;
use infrastructure_common::{ComponentPhase, DependencyError, DependencyResult, PhaseRecord, TypeInfo};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 注册表中的组件记录
pub struct Registration {
    identity: String,
    concrete: TypeInfo,
    capabilities: Vec<Capability>,
    provided_types: Vec<TypeInfo>,
    order: i32,
    history: Vec<PhaseRecord>,
    instance: Option<FrozenComponent>,
}

impl Registration {
    /// 组件标识
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// 具体类型
    pub fn concrete(&self) -> TypeInfo {
        self.concrete
    }

    /// 排序值
    pub fn order(&self) -> i32 {
        self.order
    }

    /// 声明的能力
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// 当前阶段
    pub fn phase(&self) -> ComponentPhase {
        self.history
            .last()
            .map_or(ComponentPhase::Registered, |record| record.phase)
    }

    /// 阶段迁移历史
    pub fn history(&self) -> &[PhaseRecord] {
        &self.history
    }

    /// 是否满足某项能力
    pub fn has_capability(&self, capability: TypeId) -> bool {
        self.capability(capability).is_some()
    }

    /// 是否为某项能力的默认实现
    pub fn is_default_for(&self, capability: TypeId) -> bool {
        self.capability(capability)
            .is_some_and(Capability::is_default)
    }

    /// 作为提供者时是否能提供该类型
    pub fn provides(&self, target: TypeId) -> bool {
        self.provided_types.iter().any(|info| info.id == target)
    }

    /// 冻结后的组件
    pub fn component(&self) -> Option<&Arc<dyn Component>> {
        self.instance.as_ref().map(|frozen| &frozen.component)
    }

    /// 是否已冻结
    pub fn is_frozen(&self) -> bool {
        self.instance.is_some()
    }

    /// 将实例转换为指定能力
    pub fn cast(&self, capability: TypeId) -> Option<Candidate> {
        let frozen = self.instance.as_ref()?;
        self.capability(capability)?.cast(&frozen.instance)
    }

    fn capability(&self, capability: TypeId) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|existing| existing.info().id == capability)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("identity", &self.identity)
            .field("concrete", &self.concrete.name)
            .field("capabilities", &self.capabilities)
            .field("order", &self.order)
            .field("history", &self.history)
            .field("frozen", &self.instance.is_some())
            .finish()
    }
}

/// 组件注册表
#[derive(Default)]
pub struct Registry {
    entries: Vec<Registration>,
    pending: Vec<Option<Box<dyn ComponentSlot>>>,
    by_identity: HashMap<String, usize>,
    by_capability: HashMap<TypeId, Vec<usize>>,
    sequence: u64,
}

impl Registry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件
    ///
    /// 标识冲突且未声明覆盖时返回 [`DependencyError::DuplicateIdentity`]，注册表保持不变。
    pub fn register(&mut self, descriptor: impl Into<Descriptor>) -> DependencyResult<()> {
        let parts = descriptor.into().into_parts();
        let existing = self.by_identity.get(&parts.identity).copied();

        if existing.is_some() && !parts.replace {
            return Err(DependencyError::DuplicateIdentity {
                identity: parts.identity,
            });
        }

        let registered = self.next_record(ComponentPhase::Registered);
        let registration = Registration {
            identity: parts.identity.clone(),
            concrete: parts.concrete,
            capabilities: parts.capabilities,
            provided_types: parts.provided_types,
            order: parts.order,
            history: vec![registered],
            instance: None,
        };

        match existing {
            Some(index) => {
                warn!("组件 {} 被覆盖注册", parts.identity);
                self.unindex(index);
                self.entries[index] = registration;
                self.pending[index] = Some(parts.slot);
                self.index(index);
            }
            None => {
                let index = self.entries.len();
                self.entries.push(registration);
                self.pending.push(Some(parts.slot));
                self.by_identity.insert(parts.identity.clone(), index);
                self.index(index);
            }
        }
        debug!("组件已注册: {} ({})", parts.identity, parts.concrete.short_name());
        Ok(())
    }

    /// 仅在标识不存在时注册，返回是否实际注册
    pub fn register_once(&mut self, descriptor: impl Into<Descriptor>) -> bool {
        let descriptor = descriptor.into();
        if self.by_identity.contains_key(descriptor.identity()) {
            debug!("组件 {} 已存在, 跳过注册", descriptor.identity());
            return false;
        }
        self.register(descriptor).is_ok()
    }

    /// 按标识查找
    pub fn lookup(&self, identity: &str) -> Option<&Registration> {
        self.index_of(identity).map(|index| &self.entries[index])
    }

    /// 按能力查找
    ///
    /// 标识选择器等价于按标识查找后过滤能力；默认选择器在唯一候选时直接返回，
    /// 多个候选时返回唯一标记为默认的那个，否则报 [`DependencyError::AmbiguousDefault`]。
    pub fn lookup_by_capability(
        &self,
        capability: TypeInfo,
        selector: &Selector,
    ) -> DependencyResult<Option<&Registration>> {
        match selector {
            Selector::Identity(identity) => Ok(self
                .lookup(identity)
                .filter(|entry| entry.has_capability(capability.id))),
            Selector::Default => Ok(self
                .select_default(capability)?
                .map(|index| &self.entries[index])),
            Selector::Config { .. } => Ok(None),
        }
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub(crate) fn index_of(&self, identity: &str) -> Option<usize> {
        self.by_identity.get(identity).copied()
    }

    pub(crate) fn entry(&self, index: usize) -> &Registration {
        &self.entries[index]
    }

    pub(crate) fn candidates(&self, capability: TypeId) -> &[usize] {
        self.by_capability
            .get(&capability)
            .map_or(&[], Vec::as_slice)
    }

    pub(crate) fn select_default(&self, capability: TypeInfo) -> DependencyResult<Option<usize>> {
        let candidates = self.candidates(capability.id);
        self.choose(capability, candidates, |entry| {
            entry.is_default_for(capability.id)
        })
    }

    pub(crate) fn select_provider(&self, target: TypeInfo) -> DependencyResult<Option<usize>> {
        let providers: Vec<usize> = (0..self.entries.len())
            .filter(|&index| self.entries[index].provides(target.id))
            .collect();
        self.choose(target, &providers, |entry| {
            entry.is_default_for(entry.concrete.id)
        })
    }

    fn choose(
        &self,
        capability: TypeInfo,
        candidates: &[usize],
        is_default: impl Fn(&Registration) -> bool,
    ) -> DependencyResult<Option<usize>> {
        match candidates {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => {
                let defaults: Vec<usize> = many
                    .iter()
                    .copied()
                    .filter(|&index| is_default(&self.entries[index]))
                    .collect();
                match defaults.as_slice() {
                    [chosen] => Ok(Some(*chosen)),
                    _ => Err(DependencyError::AmbiguousDefault {
                        capability: capability.name.to_string(),
                        candidates: many
                            .iter()
                            .map(|&index| self.entries[index].identity.clone())
                            .collect(),
                    }),
                }
            }
        }
    }

    pub(crate) fn take_pending(&mut self) -> Vec<Option<Box<dyn ComponentSlot>>> {
        let count = self.pending.len();
        std::mem::replace(&mut self.pending, (0..count).map(|_| None).collect())
    }

    pub(crate) fn freeze(&mut self, index: usize, frozen: FrozenComponent) {
        self.entries[index].instance = Some(frozen);
    }

    /// 推进组件阶段，非法迁移会被忽略并返回 `false`
    pub(crate) fn advance(&mut self, index: usize, phase: ComponentPhase) -> bool {
        let current = self.entries[index].phase();
        if !current.can_advance_to(phase) {
            warn!(
                "组件 {} 不能从 {} 迁移到 {}",
                self.entries[index].identity, current, phase
            );
            return false;
        }
        let record = self.next_record(phase);
        self.entries[index].history.push(record);
        true
    }

    fn next_record(&mut self, phase: ComponentPhase) -> PhaseRecord {
        self.sequence += 1;
        PhaseRecord {
            phase,
            sequence: self.sequence,
            at: Utc::now(),
        }
    }

    fn index(&mut self, index: usize) {
        for capability in &self.entries[index].capabilities {
            let list = self.by_capability.entry(capability.info().id).or_default();
            list.push(index);
            list.sort_unstable();
        }
    }

    fn unindex(&mut self, index: usize) {
        for capability in &self.entries[index].capabilities {
            if let Some(list) = self.by_capability.get_mut(&capability.info().id) {
                list.retain(|&existing| existing != index);
            }
        }
    }
}
