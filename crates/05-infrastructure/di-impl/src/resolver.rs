//! 依赖解析与排序
//!
//! 在注入前为每个依赖请求确定来源，建立依赖图，检测循环依赖并计算初始化顺序。
//! 延迟绑定请求不产生依赖边。

use crate::registry::{Registration, Registry};
use config_abstractions::Configure;
use di_abstractions::{Cardinality, ComponentSlot, DependencyRequest, Selector};
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use tracing::debug;

/// 依赖请求的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
    /// 可选依赖缺失
    Absent,
    /// 已注册的静态实例（多值请求可能有多个）
    Static(Vec<usize>),
    /// 由提供者构造
    Provider(usize),
    /// 从默认配置源解码
    Config(usize),
}

impl Source {
    fn indices(&self) -> Vec<usize> {
        match self {
            Self::Absent => Vec::new(),
            Self::Static(indices) => indices.clone(),
            Self::Provider(index) | Self::Config(index) => vec![*index],
        }
    }
}

/// 解析后的请求
#[derive(Debug)]
pub(crate) struct PlannedRequest {
    pub request: DependencyRequest,
    pub source: Source,
}

/// 注入计划
#[derive(Debug)]
pub(crate) struct Plan {
    /// 按注册下标排列的请求
    pub requests: Vec<Vec<PlannedRequest>>,
    /// 初始化顺序（依赖先于依赖方）
    pub order: Vec<usize>,
}

/// 生成注入计划
pub(crate) fn plan(
    registry: &Registry,
    pending: &[Option<Box<dyn ComponentSlot>>],
) -> DependencyResult<Plan> {
    let count = registry.len();
    let mut requests = Vec::with_capacity(count);
    let mut edges: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];

    for (index, dependencies) in edges.iter_mut().enumerate() {
        let owner = registry.entry(index);
        let declared = match pending.get(index).and_then(Option::as_ref) {
            Some(slot) => slot.component().dependencies()?,
            None => Vec::new(),
        };

        let mut planned = Vec::with_capacity(declared.len());
        for request in declared {
            let source = resolve(registry, owner, &request)?;
            debug!(
                "解析依赖 {}.{} -> {:?}",
                owner.identity(),
                request.slot(),
                source
            );
            if !request.is_late() {
                dependencies.extend(source.indices());
            }
            planned.push(PlannedRequest { request, source });
        }
        requests.push(planned);
    }

    detect_cycles(registry, &edges)?;
    let order = topological_order(registry, &edges);
    Ok(Plan { requests, order })
}

fn resolve(
    registry: &Registry,
    owner: &Registration,
    request: &DependencyRequest,
) -> DependencyResult<Source> {
    let source = locate(registry, owner, request)?;
    // 延迟绑定只保留弱引用，提供者构造的值无人持有
    if let (true, Source::Provider(index)) = (request.is_late(), &source) {
        return Err(DependencyError::IncompatibleType {
            component: owner.identity().to_string(),
            slot: request.slot().to_string(),
            expected: request.target().name.to_string(),
            found: format!("{} (提供者构造的值不能延迟绑定)", registry.entry(*index).identity()),
        });
    }
    Ok(source)
}

fn locate(
    registry: &Registry,
    owner: &Registration,
    request: &DependencyRequest,
) -> DependencyResult<Source> {
    let target = request.target();
    match request.selector() {
        Selector::Config { .. } => match registry.select_default(TypeInfo::of::<dyn Configure>())? {
            Some(index) => Ok(Source::Config(index)),
            None => absent(owner, request),
        },
        Selector::Identity(identity) => {
            let Some(index) = registry.index_of(identity) else {
                return absent(owner, request);
            };
            let found = registry.entry(index);
            if found.has_capability(target.id) {
                Ok(Source::Static(vec![index]))
            } else if found.provides(target.id) {
                Ok(Source::Provider(index))
            } else {
                Err(DependencyError::IncompatibleType {
                    component: owner.identity().to_string(),
                    slot: request.slot().to_string(),
                    expected: target.name.to_string(),
                    found: found.concrete().name.to_string(),
                })
            }
        }
        Selector::Default => {
            if request.cardinality() == Cardinality::Many {
                return Ok(Source::Static(registry.candidates(target.id).to_vec()));
            }
            if let Some(index) = registry.select_default(target)? {
                return Ok(Source::Static(vec![index]));
            }
            match registry.select_provider(target)? {
                Some(index) => Ok(Source::Provider(index)),
                None => absent(owner, request),
            }
        }
    }
}

fn absent(owner: &Registration, request: &DependencyRequest) -> DependencyResult<Source> {
    if request.is_required() {
        Err(DependencyError::UnresolvedDependency {
            component: owner.identity().to_string(),
            slot: request.slot().to_string(),
            selector: format!("{} ({})", request.selector(), request.target().short_name()),
        })
    } else {
        Ok(Source::Absent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// 深度优先检测循环依赖，错误中包含完整的环路径
fn detect_cycles(registry: &Registry, edges: &[BTreeSet<usize>]) -> DependencyResult<()> {
    let mut marks = vec![Mark::Unvisited; edges.len()];
    let mut path = Vec::new();
    for start in 0..edges.len() {
        if marks[start] == Mark::Unvisited {
            visit(registry, edges, start, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

fn visit(
    registry: &Registry,
    edges: &[BTreeSet<usize>],
    node: usize,
    marks: &mut [Mark],
    path: &mut Vec<usize>,
) -> DependencyResult<()> {
    match marks[node] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            let begin = path.iter().position(|&n| n == node).unwrap_or(0);
            let cycle = path[begin..]
                .iter()
                .chain(std::iter::once(&node))
                .map(|&n| registry.entry(n).identity().to_string())
                .collect();
            return Err(DependencyError::CyclicDependency { cycle });
        }
        Mark::Unvisited => {}
    }

    marks[node] = Mark::Visiting;
    path.push(node);
    for &dependency in &edges[node] {
        visit(registry, edges, dependency, marks, path)?;
    }
    path.pop();
    marks[node] = Mark::Done;
    Ok(())
}

/// Kahn 算法，就绪集合中排序值小的先出，同值按注册顺序
fn topological_order(registry: &Registry, edges: &[BTreeSet<usize>]) -> Vec<usize> {
    let count = edges.len();
    let mut remaining: Vec<usize> = edges.iter().map(BTreeSet::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (node, dependencies) in edges.iter().enumerate() {
        for &dependency in dependencies {
            dependents[dependency].push(node);
        }
    }

    let mut ready: BinaryHeap<Reverse<(i32, usize)>> = (0..count)
        .filter(|&node| remaining[node] == 0)
        .map(|node| Reverse((registry.entry(node).order(), node)))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some(Reverse((_, node))) = ready.pop() {
        order.push(node);
        for &dependent in &dependents[node] {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.push(Reverse((registry.entry(dependent).order(), dependent)));
            }
        }
    }
    order
}
