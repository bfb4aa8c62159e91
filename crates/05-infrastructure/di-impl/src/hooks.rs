//! 用户代码执行
//!
//! 生命周期钩子与提供者中的 panic 会被捕获并转换为带调用栈的错误。调用栈只在容器
//! 正在轮询用户代码时记录，其他位置的 panic 不受影响。

use futures::future::poll_fn;
use futures::FutureExt;
use infrastructure_common::{HookError, HookResult};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::Duration;

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static INSTALL: Once = Once::new();

/// 安装记录调用栈的 panic hook，保留原有 hook 的行为
fn install_backtrace_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARD_DEPTH.with(Cell::get) > 0 {
                let backtrace = Backtrace::force_capture().to_string();
                LAST_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(backtrace));
            }
            previous(info);
        }));
    });
}

/// 轮询期间标记当前线程正在执行用户代码，unwind 时同样复位
struct GuardScope;

impl GuardScope {
    fn enter() -> Self {
        GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        GUARD_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知 panic".to_string()
    }
}

/// 捕获到的 panic
#[derive(Debug)]
pub(crate) struct CaughtPanic {
    pub message: String,
    pub backtrace: String,
}

/// 执行用户提供的 future，panic 转换为 [`CaughtPanic`]
pub(crate) async fn catch_panic<F: Future>(future: F) -> Result<F::Output, CaughtPanic> {
    install_backtrace_hook();
    let mut future = Box::pin(future);
    let tracked = poll_fn(move |cx| {
        let _scope = GuardScope::enter();
        future.as_mut().poll(cx)
    });

    AssertUnwindSafe(tracked).catch_unwind().await.map_err(|payload| {
        let backtrace = LAST_BACKTRACE
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_default();
        CaughtPanic {
            message: panic_message(payload.as_ref()),
            backtrace,
        }
    })
}

/// 执行钩子
///
/// `timeout` 为 `None` 时不限时。
pub(crate) async fn run_hook<F>(hook: F, timeout: Option<Duration>) -> Result<(), HookError>
where
    F: Future<Output = HookResult>,
{
    let guarded = catch_panic(hook);
    let outcome = match timeout {
        Some(after) => match tokio::time::timeout(after, guarded).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(HookError::TimedOut { after }),
        },
        None => guarded.await,
    };

    match outcome {
        Ok(result) => result.map_err(HookError::from),
        Err(CaughtPanic { message, backtrace }) => Err(HookError::Panicked { message, backtrace }),
    }
}
