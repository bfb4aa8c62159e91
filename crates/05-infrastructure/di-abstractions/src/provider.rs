//! 提供者机制
//!
//! 提供者按请求即时构造值，而不是保存单个静态实例。是否按选择器复用实例由提供者自己决定，
//! 需要复用时可以借助 [`ProviderCache`]。

use crate::request::Candidate;
use crate::tag::Tag;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use infrastructure_common::{ProviderError, TypeInfo};
use std::fmt;
use std::sync::Arc;

/// 提供请求
#[derive(Debug, Clone, Copy)]
pub struct ProvideRequest<'a> {
    /// 请求方组件标识
    pub requester: &'a str,
    /// 请求方字段名
    pub slot: &'a str,
    /// 请求的类型
    pub target: TypeInfo,
    /// 请求方标签
    pub tag: &'a Tag,
}

impl ProvideRequest<'_> {
    /// 原始选择器文本（标签第一个逗号之后的部分）
    pub fn selector(&self) -> &str {
        self.tag.extend()
    }

    /// 读取 `key=value` 选项
    pub fn option(&self, key: &str) -> Option<&str> {
        self.tag.option(key)
    }

    /// 要求选择器非空
    pub fn require_key(&self) -> Result<&str, ProviderError> {
        let selector = self.selector().trim();
        if selector.is_empty() {
            Err(ProviderError::NeedsKey {
                requested: self.target.name.to_string(),
            })
        } else {
            Ok(selector)
        }
    }

    /// 请求的类型是否为 `T`
    pub fn wants<T: ?Sized + 'static>(&self) -> bool {
        self.target == TypeInfo::of::<T>()
    }

    /// 返回类型不匹配错误
    pub fn mismatch(&self) -> ProviderError {
        ProviderError::TypeMismatch {
            requested: self.target.name.to_string(),
        }
    }
}

/// 提供者
#[async_trait]
pub trait Provider: Send + Sync {
    /// 能提供的类型
    fn provided_types(&self) -> Vec<TypeInfo>;

    /// 为请求构造值，返回的实例必须是 `Arc<T>`（`T` 为请求的类型）
    async fn provide(&self, request: ProvideRequest<'_>) -> Result<Candidate, ProviderError>;
}

/// 将实例包装为提供结果
pub fn provided<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Candidate {
    Box::new(value)
}

/// 按选择器缓存提供结果
pub struct ProviderCache<V: ?Sized> {
    entries: DashMap<String, Arc<V>>,
}

impl<V: ?Sized + Send + Sync> ProviderCache<V> {
    /// 创建缓存
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 读取缓存，不存在时调用 `make` 构造并写入
    pub fn get_or_try_insert_with<E, F>(&self, key: &str, make: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<Arc<V>, E>,
    {
        if let Some(existing) = self.entries.get(key) {
            return Ok(Arc::clone(existing.value()));
        }
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let value = make()?;
                entry.insert(Arc::clone(&value));
                Ok(value)
            }
        }
    }

    /// 已缓存的数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: ?Sized + Send + Sync> Default for ProviderCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ?Sized> fmt::Debug for ProviderCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCache")
            .field("keys", &self.entries.iter().map(|e| e.key().clone()).collect::<Vec<_>>())
            .finish()
    }
}
