//! # 示例应用程序
//!
//! 演示组件注册、依赖注入、配置绑定以及启动/停止生命周期。
//!
//! ```text
//! cargo run -p example-app -- --conf example-app/config --env local
//! ```

use async_trait::async_trait;
use di_abstractions::{Active, Component, Descriptor, HookResult, Initialize, Inject};
use infrastructure_common::{Logger, Tracer};
use infrastructure_composition::{Application, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

/// 问候语
#[derive(Component)]
#[component(init)]
struct GreetingBook {
    #[inject]
    logger: Inject<dyn Logger>,
    #[inject("config,greeting.words=hello")]
    words: Vec<String>,
    #[inject("config,greeting.banner=lorn")]
    banner: String,
}

impl GreetingBook {
    fn new() -> Self {
        Self {
            logger: Inject::default(),
            words: Vec::new(),
            banner: String::new(),
        }
    }

    fn pick(&self, round: usize) -> &str {
        self.words
            .get(round % self.words.len().max(1))
            .map(String::as_str)
            .unwrap_or("...")
    }
}

#[async_trait]
impl Initialize for GreetingBook {
    async fn init(&self) -> HookResult {
        self.logger.info(&format!(
            "[{}] 载入 {} 条问候语",
            self.banner,
            self.words.len()
        ));
        Ok(())
    }
}

/// 心跳服务，按配置的间隔在后台输出问候语
#[derive(Component)]
#[component(active)]
struct Heartbeat {
    #[inject]
    book: Inject<GreetingBook>,
    #[inject]
    tracer: Inject<dyn Tracer>,
    #[inject("config,heartbeat.interval=5s")]
    interval: Duration,
    shutdown: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Heartbeat {
    fn new() -> Self {
        Self {
            book: Inject::default(),
            tracer: Inject::default(),
            interval: Duration::from_secs(5),
            shutdown: Arc::new(Notify::new()),
            task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Active for Heartbeat {
    async fn start(&self) -> HookResult {
        let book = self.book.clone();
        let shutdown = self.shutdown.clone();
        let interval = self.interval;
        info!("心跳服务启动, 间隔 {:?}", interval);

        let handle = self.tracer.go(Box::pin(async move {
            let mut round = 0;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        info!("心跳 #{}: {}", round, book.pick(round));
                        round += 1;
                    }
                    _ = shutdown.notified() => break,
                }
            }
        }));
        *self.task.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> HookResult {
        self.shutdown.notify_one();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            handle.await?;
        }
        info!("心跳服务已停止");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = Application::builder()
        .with_name("example-app")
        .with_logging(LoggingConfig::development())
        .with_config_from_args()
        .register(Descriptor::new(GreetingBook::new()).named("greetings"))
        .register(Descriptor::new(Heartbeat::new()).named("heartbeat"))
        .build()?;

    app.start().await?;
    info!("应用状态:\n{}", serde_json::to_string_pretty(&app.status())?);
    info!(
        "初始化顺序: {:?}",
        app.container().initialization_order()
    );

    tokio::signal::ctrl_c().await?;
    info!("收到退出信号，正在关闭应用");
    app.shutdown().await?;
    Ok(())
}
