//! 调用链追踪
//!
//! 追踪ID保存在 tokio 的 task-local 中，[`Tracer::go`] 派生的后台任务会继承当前ID。

use std::future::Future;
use std::pin::Pin;
use tokio::task::JoinHandle;

tokio::task_local! {
    static TRACE_ID: String;
}

/// 后台任务
pub type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 获取当前任务的追踪ID
pub fn current_trace_id() -> Option<String> {
    TRACE_ID.try_with(Clone::clone).ok()
}

/// 生成新的追踪ID
pub fn new_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// 在指定追踪ID下执行 future
pub async fn with_trace_id<F>(trace_id: String, future: F) -> F::Output
where
    F: Future,
{
    TRACE_ID.scope(trace_id, future).await
}

/// 追踪协作者
pub trait Tracer: Send + Sync {
    /// 当前追踪ID，不存在时生成一个新的
    fn trace_id(&self) -> String;

    /// 在后台执行任务并携带当前追踪ID
    fn go(&self, task: BackgroundTask) -> JoinHandle<()>;
}

/// 默认追踪实现
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTracer;

impl Tracer for DefaultTracer {
    fn trace_id(&self) -> String {
        current_trace_id().unwrap_or_else(new_trace_id)
    }

    fn go(&self, task: BackgroundTask) -> JoinHandle<()> {
        let trace_id = self.trace_id();
        tokio::spawn(TRACE_ID.scope(trace_id, task))
    }
}
