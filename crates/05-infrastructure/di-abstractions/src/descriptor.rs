//! 组件描述符
//!
//! 描述符在注册时显式声明组件满足的能力（trait 对象或具体类型），注册表据此建立能力索引，
//! 不依赖运行时的类型遍历。

use crate::component::Component;
use crate::request::Candidate;
use infrastructure_common::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 冻结后的共享实例
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

type Caster = Arc<dyn Fn(&SharedInstance) -> Option<Candidate> + Send + Sync>;

/// 组件能力
#[derive(Clone)]
pub struct Capability {
    info: TypeInfo,
    is_default: bool,
    cast: Caster,
}

impl Capability {
    fn concrete<T: Component>() -> Self {
        Self {
            info: TypeInfo::of::<T>(),
            is_default: false,
            cast: Arc::new(|instance: &SharedInstance| {
                Arc::clone(instance)
                    .downcast::<T>()
                    .ok()
                    .map(|typed| Box::new(typed) as Candidate)
            }),
        }
    }

    fn mapped<T, C, F>(cast: F, is_default: bool) -> Self
    where
        T: Component,
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    {
        Self {
            info: TypeInfo::of::<C>(),
            is_default,
            cast: Arc::new(move |instance: &SharedInstance| {
                Arc::clone(instance)
                    .downcast::<T>()
                    .ok()
                    .map(|typed| Box::new(cast(typed)) as Candidate)
            }),
        }
    }

    /// 能力类型
    pub fn info(&self) -> TypeInfo {
        self.info
    }

    /// 是否为该能力的默认实现
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// 将共享实例转换为该能力的 `Arc`
    pub fn cast(&self, instance: &SharedInstance) -> Option<Candidate> {
        (self.cast)(instance)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("type", &self.info.name)
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// 冻结后的组件
#[derive(Clone)]
pub struct FrozenComponent {
    /// 组件行为
    pub component: Arc<dyn Component>,
    /// 用于能力转换的实例
    pub instance: SharedInstance,
}

/// 尚未冻结的组件
pub trait ComponentSlot: Send + Sync {
    /// 只读访问
    fn component(&self) -> &dyn Component;

    /// 注入期间的可变访问
    fn component_mut(&mut self) -> &mut dyn Component;

    /// 冻结为共享实例
    fn freeze(self: Box<Self>) -> FrozenComponent;
}

struct TypedSlot<T>(T);

impl<T: Component> ComponentSlot for TypedSlot<T> {
    fn component(&self) -> &dyn Component {
        &self.0
    }

    fn component_mut(&mut self) -> &mut dyn Component {
        &mut self.0
    }

    fn freeze(self: Box<Self>) -> FrozenComponent {
        let shared = Arc::new(self.0);
        let component: Arc<dyn Component> = Arc::clone(&shared) as Arc<dyn Component>;
        FrozenComponent {
            component,
            instance: shared,
        }
    }
}

/// 组件描述符构建器
pub struct DescriptorBuilder<T> {
    instance: T,
    identity: Option<String>,
    order: i32,
    replace: bool,
    capabilities: Vec<Capability>,
}

impl<T: Component> DescriptorBuilder<T> {
    /// 指定组件标识，缺省为具体类型名
    pub fn named(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// 设置排序值，无依赖关系的组件按该值升序初始化
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 允许覆盖同一标识下已有的组件
    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    /// 声明组件满足的能力
    pub fn with_capability<C, F>(self, cast: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    {
        self.push(Capability::mapped(cast, false))
    }

    /// 声明能力并标记为默认实现
    pub fn with_default_capability<C, F>(self, cast: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    {
        self.push(Capability::mapped(cast, true))
    }

    /// 标记为具体类型的默认实现
    pub fn as_default(mut self) -> Self {
        let concrete = TypeInfo::of::<T>();
        for capability in &mut self.capabilities {
            if capability.info == concrete {
                capability.is_default = true;
            }
        }
        self
    }

    fn push(mut self, capability: Capability) -> Self {
        self.capabilities.retain(|existing| existing.info != capability.info);
        self.capabilities.push(capability);
        self
    }

    /// 生成描述符
    pub fn build(self) -> Descriptor {
        let provided_types = self
            .instance
            .as_provider()
            .map(|provider| provider.provided_types())
            .unwrap_or_default();
        let concrete = TypeInfo::of::<T>();
        Descriptor {
            identity: self.identity.unwrap_or_else(|| concrete.name.to_string()),
            concrete,
            capabilities: self.capabilities,
            provided_types,
            order: self.order,
            replace: self.replace,
            slot: Box::new(TypedSlot(self.instance)),
        }
    }
}

impl<T: Component> From<DescriptorBuilder<T>> for Descriptor {
    fn from(builder: DescriptorBuilder<T>) -> Self {
        builder.build()
    }
}

/// 组件描述符
pub struct Descriptor {
    identity: String,
    concrete: TypeInfo,
    capabilities: Vec<Capability>,
    provided_types: Vec<TypeInfo>,
    order: i32,
    replace: bool,
    slot: Box<dyn ComponentSlot>,
}

/// 描述符拆分后的各部分
pub struct DescriptorParts {
    pub identity: String,
    pub concrete: TypeInfo,
    pub capabilities: Vec<Capability>,
    pub provided_types: Vec<TypeInfo>,
    pub order: i32,
    pub replace: bool,
    pub slot: Box<dyn ComponentSlot>,
}

impl Descriptor {
    /// 以组件实例开始构建描述符
    ///
    /// 具体类型本身总是一项隐式能力。
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T: Component>(instance: T) -> DescriptorBuilder<T> {
        DescriptorBuilder {
            instance,
            identity: None,
            order: 0,
            replace: false,
            capabilities: vec![Capability::concrete::<T>()],
        }
    }

    /// 组件标识
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// 具体类型
    pub fn concrete(&self) -> TypeInfo {
        self.concrete
    }

    /// 声明的能力
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// 作为提供者能提供的类型
    pub fn provided_types(&self) -> &[TypeInfo] {
        &self.provided_types
    }

    /// 排序值
    pub fn order(&self) -> i32 {
        self.order
    }

    /// 是否允许覆盖
    pub fn is_replacing(&self) -> bool {
        self.replace
    }

    /// 拆分为各部分
    pub fn into_parts(self) -> DescriptorParts {
        DescriptorParts {
            identity: self.identity,
            concrete: self.concrete,
            capabilities: self.capabilities,
            provided_types: self.provided_types,
            order: self.order,
            replace: self.replace,
            slot: self.slot,
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("identity", &self.identity)
            .field("concrete", &self.concrete.name)
            .field("capabilities", &self.capabilities)
            .field("order", &self.order)
            .field("replace", &self.replace)
            .finish_non_exhaustive()
    }
}
