//! 依赖请求
//!
//! 组件通过 [`DependencyRequest`] 声明每个注入字段需要什么、从哪里取、缺失时是否致命。

use crate::late::Late;
use crate::tag::Tag;
use config_abstractions::{decode, Configure};
use infrastructure_common::{ConfigResult, DependencyError, DependencyResult, TypeInfo};
use serde::de::DeserializeOwned;
use std::any::{type_name, Any};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// 依赖选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// 取该能力的默认实现
    Default,
    /// 按组件标识选择
    Identity(String),
    /// 绑定配置键
    Config {
        key: String,
        default: Option<String>,
    },
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("*"),
            Self::Identity(identity) => write!(f, "{identity:?}"),
            Self::Config { key, .. } => write!(f, "config:{key}"),
        }
    }
}

/// 注入字段的基数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// 恰好一个
    One,
    /// 零或一个
    Optional,
    /// 能力的全部实现
    Many,
    /// 延迟绑定（第二轮注入，不参与排序）
    Late,
}

/// 已解析的候选实例，内部为 `Arc<T>`
pub type Candidate = Box<dyn Any + Send + Sync>;

type ComponentBinder = fn(Vec<Candidate>) -> Option<Box<dyn Any + Send>>;
type ConfigBinder = fn(&dyn Configure, &str, Option<&str>) -> ConfigResult<Box<dyn Any + Send>>;

#[derive(Clone, Copy)]
enum Binder {
    Component(ComponentBinder),
    Config(ConfigBinder),
}

/// 依赖请求
#[derive(Clone)]
pub struct DependencyRequest {
    slot: String,
    target: TypeInfo,
    value_type: &'static str,
    selector: Selector,
    cardinality: Cardinality,
    required: bool,
    tag: Tag,
    binder: Binder,
}

impl DependencyRequest {
    /// 创建组件依赖请求，`F` 为字段类型
    pub fn component<F: InjectTarget>(slot: impl Into<String>, tag: &str) -> DependencyResult<Self> {
        let tag = Tag::parse(tag)?;
        if tag.is_config() {
            return Err(DependencyError::invalid_tag(
                tag.raw(),
                "配置标签只能用于配置字段",
            ));
        }
        let selector = match tag.name() {
            Some(identity) => Selector::Identity(identity.to_string()),
            None => Selector::Default,
        };
        let cardinality = F::cardinality();
        let required = match cardinality {
            Cardinality::One | Cardinality::Late => !tag.is_optional(),
            Cardinality::Optional | Cardinality::Many => false,
        };
        Ok(Self {
            slot: slot.into(),
            target: F::target(),
            value_type: type_name::<F>(),
            selector,
            cardinality,
            required,
            tag,
            binder: Binder::Component(bind_component::<F>),
        })
    }

    /// 创建配置依赖请求，标签形如 `config,key=default`
    pub fn config<T>(slot: impl Into<String>, tag: &str) -> DependencyResult<Self>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let tag = Tag::parse(tag)?;
        if !tag.is_config() {
            return Err(DependencyError::invalid_tag(tag.raw(), "配置字段的标签必须以 config 开头"));
        }
        let (key, default) = tag
            .config_key()
            .ok_or_else(|| DependencyError::invalid_tag(tag.raw(), "缺少配置键"))?;
        Ok(Self {
            slot: slot.into(),
            target: TypeInfo::of::<T>(),
            value_type: type_name::<T>(),
            selector: Selector::Config { key, default },
            cardinality: Cardinality::One,
            required: true,
            tag,
            binder: Binder::Config(bind_config::<T>),
        })
    }

    /// 字段名
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// 目标能力
    pub fn target(&self) -> TypeInfo {
        self.target
    }

    /// 字段类型名称
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// 选择器
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// 基数
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// 缺失是否致命
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// 是否为延迟绑定
    pub fn is_late(&self) -> bool {
        self.cardinality == Cardinality::Late
    }

    /// 原始标签
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// 将候选实例组装成字段值，类型不符时返回 `None`
    pub fn assemble(&self, candidates: Vec<Candidate>) -> Option<Box<dyn Any + Send>> {
        match self.binder {
            Binder::Component(bind) => bind(candidates),
            Binder::Config(_) => None,
        }
    }

    /// 从配置源解码字段值
    pub fn decode_config(&self, configure: &dyn Configure) -> ConfigResult<Option<Box<dyn Any + Send>>> {
        match (&self.binder, &self.selector) {
            (Binder::Config(bind), Selector::Config { key, default }) => {
                bind(configure, key, default.as_deref()).map(Some)
            }
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for DependencyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRequest")
            .field("slot", &self.slot)
            .field("target", &self.target.name)
            .field("selector", &self.selector)
            .field("cardinality", &self.cardinality)
            .field("required", &self.required)
            .finish()
    }
}

fn bind_component<F: InjectTarget>(candidates: Vec<Candidate>) -> Option<Box<dyn Any + Send>> {
    F::assemble(candidates).map(|value| Box::new(value) as Box<dyn Any + Send>)
}

fn bind_config<T>(
    configure: &dyn Configure,
    key: &str,
    default: Option<&str>,
) -> ConfigResult<Box<dyn Any + Send>>
where
    T: DeserializeOwned + Send + 'static,
{
    decode::<dyn Configure, T>(configure, key, default).map(|value| Box::new(value) as Box<dyn Any + Send>)
}

/// 可以作为注入字段的类型
pub trait InjectTarget: Sized + Send + 'static {
    /// 目标能力
    fn target() -> TypeInfo;

    /// 基数
    fn cardinality() -> Cardinality;

    /// 由候选实例组装字段值
    fn assemble(candidates: Vec<Candidate>) -> Option<Self>;
}

fn take_arc<T: ?Sized + Send + Sync + 'static>(candidate: Candidate) -> Option<Arc<T>> {
    candidate.downcast::<Arc<T>>().ok().map(|arc| *arc)
}

impl<T: ?Sized + Send + Sync + 'static> InjectTarget for Arc<T> {
    fn target() -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn cardinality() -> Cardinality {
        Cardinality::One
    }

    fn assemble(candidates: Vec<Candidate>) -> Option<Self> {
        candidates.into_iter().next().and_then(take_arc)
    }
}

impl<T: ?Sized + Send + Sync + 'static> InjectTarget for Inject<T> {
    fn target() -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn cardinality() -> Cardinality {
        Cardinality::One
    }

    fn assemble(candidates: Vec<Candidate>) -> Option<Self> {
        candidates
            .into_iter()
            .next()
            .and_then(take_arc)
            .map(Inject::from)
    }
}

impl<T: ?Sized + Send + Sync + 'static> InjectTarget for Option<Arc<T>> {
    fn target() -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn cardinality() -> Cardinality {
        Cardinality::Optional
    }

    fn assemble(candidates: Vec<Candidate>) -> Option<Self> {
        match candidates.into_iter().next() {
            Some(candidate) => take_arc(candidate).map(Some),
            None => Some(None),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> InjectTarget for Vec<Arc<T>> {
    fn target() -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn cardinality() -> Cardinality {
        Cardinality::Many
    }

    fn assemble(candidates: Vec<Candidate>) -> Option<Self> {
        candidates.into_iter().map(take_arc).collect()
    }
}

impl<T: ?Sized + Send + Sync + 'static> InjectTarget for Late<T> {
    fn target() -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn cardinality() -> Cardinality {
        Cardinality::Late
    }

    fn assemble(candidates: Vec<Candidate>) -> Option<Self> {
        match candidates.into_iter().next() {
            Some(candidate) => take_arc::<T>(candidate).map(|arc| Late::bound(&arc)),
            None => Some(Late::new()),
        }
    }
}

/// 必需的单个依赖
///
/// 注册时为空，引导完成后保证已注入。
pub struct Inject<T: ?Sized>(Option<Arc<T>>);

impl<T: ?Sized> Inject<T> {
    /// 已注入的实例
    pub fn get(&self) -> Option<&Arc<T>> {
        self.0.as_ref()
    }

    /// 是否已注入
    pub fn is_injected(&self) -> bool {
        self.0.is_some()
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T: ?Sized> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> From<Arc<T>> for Inject<T> {
    fn from(value: Arc<T>) -> Self {
        Self(Some(value))
    }
}

impl<T: ?Sized> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.0 {
            Some(value) => value.as_ref(),
            None => panic!("依赖 {} 尚未注入", type_name::<T>()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("target", &type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}

/// 交给组件的注入值
pub struct Injected {
    owner: String,
    slot: String,
    value_type: &'static str,
    value: Box<dyn Any + Send>,
}

impl Injected {
    /// 创建注入值
    pub fn new(
        owner: impl Into<String>,
        slot: impl Into<String>,
        value_type: &'static str,
        value: Box<dyn Any + Send>,
    ) -> Self {
        Self {
            owner: owner.into(),
            slot: slot.into(),
            value_type,
            value,
        }
    }

    /// 目标字段名
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// 接收方组件标识
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// 取出字段值
    pub fn take<T: 'static>(self) -> DependencyResult<T> {
        let Self {
            owner,
            slot,
            value_type,
            value,
        } = self;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(DependencyError::IncompatibleType {
                component: owner,
                slot,
                expected: type_name::<T>().to_string(),
                found: value_type.to_string(),
            }),
        }
    }

    /// 组件没有对应字段时返回的错误
    pub fn unexpected(self) -> DependencyError {
        DependencyError::UnknownSlot {
            component: self.owner,
            slot: self.slot,
        }
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("owner", &self.owner)
            .field("slot", &self.slot)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}
