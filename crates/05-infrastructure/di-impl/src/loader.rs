//! 一次性加载
//!
//! 并发调用同一个加载器时只有一个调用方真正执行，其余调用方阻塞等待并拿到同一个结果。

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 只执行一次的守卫
pub struct OnceGuard<R> {
    cell: OnceCell<R>,
}

impl<R: Clone> OnceGuard<R> {
    /// 创建守卫
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 首次调用时执行 `f`，之后返回缓存的结果
    pub fn run(&self, f: impl FnOnce() -> R) -> R {
        self.cell.get_or_init(f).clone()
    }

    /// 是否已执行完成
    pub fn is_done(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<R: Clone> Default for OnceGuard<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for OnceGuard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceGuard")
            .field("done", &self.cell.get().is_some())
            .finish()
    }
}

/// 包装函数，使其无论被调用多少次都只执行一次
pub fn once_load<R, F>(f: F) -> impl Fn() -> R + Send + Sync
where
    R: Clone + Send + Sync,
    F: Fn() -> R + Send + Sync,
{
    let guard = Arc::new(OnceGuard::new());
    move || guard.run(&f)
}
