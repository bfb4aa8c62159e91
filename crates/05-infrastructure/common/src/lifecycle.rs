//! 组件生命周期管理

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// 生命周期钩子的返回类型
pub type HookResult = anyhow::Result<()>;

/// 组件生命周期阶段
///
/// 只能向前推进；`Stopped` 为终态，只能从 `Started` 或 `Initialized` 进入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentPhase {
    /// 已注册
    Registered,
    /// 依赖已注入
    Injected,
    /// 已初始化
    Initialized,
    /// 已启动
    Started,
    /// 已停止
    Stopped,
}

impl ComponentPhase {
    /// 是否允许迁移到目标阶段
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Registered, Self::Injected)
                | (Self::Injected, Self::Initialized)
                | (Self::Initialized, Self::Started | Self::Stopped)
                | (Self::Started, Self::Stopped)
        )
    }

    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        self == Self::Stopped
    }
}

impl fmt::Display for ComponentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registered => "Registered",
            Self::Injected => "Injected",
            Self::Initialized => "Initialized",
            Self::Started => "Started",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// 阶段迁移记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRecord {
    /// 迁移后的阶段
    pub phase: ComponentPhase,
    /// 容器内单调递增的序号，用于比较先后
    pub sequence: u64,
    /// 迁移时间
    pub at: DateTime<Utc>,
}

/// 容器整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// 引导中，接受注册
    Bootstrapping,
    /// 运行中
    Running,
    /// 关闭中
    ShuttingDown,
    /// 已终止
    Halted,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bootstrapping => "Bootstrapping",
            Self::Running => "Running",
            Self::ShuttingDown => "ShuttingDown",
            Self::Halted => "Halted",
        };
        f.write_str(name)
    }
}

/// 初始化钩子
///
/// 在组件所有非延迟依赖完成初始化之后调用。
#[async_trait]
pub trait Initialize: Send + Sync {
    /// 初始化组件
    async fn init(&self) -> HookResult;
}

/// 活动组件
///
/// 拥有运行期行为的组件（监听器、调度器等），按依赖顺序启动，按启动的逆序停止。
#[async_trait]
pub trait Active: Send + Sync {
    /// 启动组件
    async fn start(&self) -> HookResult;

    /// 停止组件
    async fn stop(&self) -> HookResult;
}
