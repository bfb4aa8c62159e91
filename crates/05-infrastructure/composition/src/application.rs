//! 应用主入口

use crate::builder::ApplicationBuilder;
use chrono::{DateTime, Utc};
use di_impl::Container;
use infrastructure_common::{ContainerState, InfrastructureResult};
use parking_lot::RwLock;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// 应用
///
/// 持有组件容器，负责把容器的引导、启动、关闭与进程信号衔接起来。
pub struct Application {
    /// 组件容器
    container: Arc<Container>,
    /// 启动完成时间
    started_at: RwLock<Option<DateTime<Utc>>>,
}

impl Application {
    /// 创建应用构建器
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub(crate) fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            started_at: RwLock::new(None),
        }
    }

    /// 组件容器
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// 引导并启动全部组件
    pub async fn start(&self) -> InfrastructureResult<()> {
        info!("启动应用: {}", self.container.config().name);
        if let Err(e) = self.container.launch().await {
            error!("应用启动失败: {}", e);
            return Err(e);
        }
        *self.started_at.write() = Some(Utc::now());
        info!("应用启动完成");
        Ok(())
    }

    /// 停止全部组件
    pub async fn shutdown(&self) -> InfrastructureResult<()> {
        info!("停止应用: {}", self.container.config().name);
        self.container.shutdown().await?;
        info!("应用已停止");
        Ok(())
    }

    /// 启动后等待 Ctrl-C 或 SIGTERM，然后关闭
    pub async fn run(&self) -> InfrastructureResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// 启动后等待 `signal` 完成，然后关闭
    pub async fn run_until<F>(&self, signal: F) -> InfrastructureResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        signal.await;
        info!("收到关闭信号");
        self.shutdown().await
    }

    /// 获取运行状态
    pub fn status(&self) -> ApplicationStatus {
        let started_at = *self.started_at.read();
        ApplicationStatus {
            name: self.container.config().name.clone(),
            state: self.container.state(),
            components: self.container.identities(),
            started_at,
            uptime_seconds: started_at.map(|at| (Utc::now() - at).num_seconds()),
        }
    }
}

/// 应用运行状态
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatus {
    /// 容器名称
    pub name: String,
    /// 容器状态
    #[serde(serialize_with = "serialize_state")]
    pub state: ContainerState,
    /// 已注册的组件标识
    pub components: Vec<String>,
    /// 启动完成时间
    pub started_at: Option<DateTime<Utc>>,
    /// 运行时长（秒）
    pub uptime_seconds: Option<i64>,
}

fn serialize_state<S: serde::Serializer>(state: &ContainerState, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(state)
}

/// 等待进程退出信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("监听 Ctrl-C 失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("监听 SIGTERM 失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
