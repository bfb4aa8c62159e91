//! 延迟绑定依赖
//!
//! 用于打破组件之间的环：字段只持有弱引用，在所有组件完成常规注入后的第二轮中填充。

use crate::request::Injected;
use infrastructure_common::DependencyResult;
use once_cell::sync::OnceCell;
use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Weak};

/// 延迟绑定字段
pub struct Late<T: ?Sized> {
    cell: OnceCell<Weak<T>>,
}

impl<T: ?Sized> Late<T> {
    /// 创建未绑定的字段
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub(crate) fn bound(value: &Arc<T>) -> Self {
        let late = Self::new();
        let _ = late.cell.set(Arc::downgrade(value));
        late
    }

    /// 获取被引用的组件，未绑定或容器已释放时返回 `None`
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().and_then(Weak::upgrade)
    }

    /// 是否已绑定
    pub fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Late<T> {
    /// 用注入值填充字段，只有第一次填充生效
    pub fn fill(&self, value: Injected) -> DependencyResult<()> {
        let other: Self = value.take()?;
        if let Some(weak) = other.cell.into_inner() {
            let _ = self.cell.set(weak);
        }
        Ok(())
    }
}

impl<T: ?Sized> Default for Late<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Late<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Late")
            .field("target", &type_name::<T>())
            .field("bound", &self.is_bound())
            .finish()
    }
}
