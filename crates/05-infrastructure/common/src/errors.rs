//! 错误类型定义

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {key}, 原因: {message}")]
    TypeConversionError { key: String, message: String },
}

impl ConfigError {
    /// 包装解析错误
    pub fn parse(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ParseError {
            source: Box::new(source),
        }
    }

    /// 创建类型转换错误
    pub fn conversion(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeConversionError {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件标识重复: {identity}")]
    DuplicateIdentity { identity: String },

    #[error("依赖未解析: 组件 {component} 的字段 {slot} 找不到 {selector}")]
    UnresolvedDependency {
        component: String,
        slot: String,
        selector: String,
    },

    #[error("类型不兼容: 组件 {component} 的字段 {slot} 期望 {expected}, 实际为 {found}")]
    IncompatibleType {
        component: String,
        slot: String,
        expected: String,
        found: String,
    },

    #[error("检测到循环依赖: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("无法确定 {capability} 的默认实现, 候选组件: {}", .candidates.join(", "))]
    AmbiguousDefault {
        capability: String,
        candidates: Vec<String>,
    },

    #[error("提供者 {provider} 无法为组件 {component} 提供类型 {requested}")]
    ProviderTypeMismatch {
        provider: String,
        component: String,
        requested: String,
    },

    #[error("提供者 {provider} 需要非空的键: 组件 {component} 请求 {requested}")]
    ProviderNeedsKey {
        provider: String,
        component: String,
        requested: String,
    },

    #[error("提供者 {provider} 为组件 {component} 创建实例失败: {source}")]
    ProviderFailed {
        provider: String,
        component: String,
        #[source]
        source: ProviderError,
    },

    #[error("配置绑定失败: 组件 {component} 的字段 {slot}: {source}")]
    ConfigBinding {
        component: String,
        slot: String,
        #[source]
        source: ConfigError,
    },

    #[error("无效的注入标签 {tag:?}: {message}")]
    InvalidTag { tag: String, message: String },

    #[error("组件 {component} 没有名为 {slot} 的注入字段")]
    UnknownSlot { component: String, slot: String },

    #[error("容器当前状态为 {state}, 拒绝注册组件 {identity}")]
    RegistrationClosed { identity: String, state: String },
}

impl DependencyError {
    /// 创建标签解析错误
    pub fn invalid_tag(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTag {
            tag: tag.into(),
            message: message.into(),
        }
    }
}

/// 提供者返回的错误
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("不支持的类型: {requested}")]
    TypeMismatch { requested: String },

    #[error("缺少键: {requested}")]
    NeedsKey { requested: String },

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("提供者发生 panic: {message}\n{backtrace}")]
    Panicked { message: String, backtrace: String },
}

impl ProviderError {
    /// 创建通用失败错误
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }
}

/// 生命周期钩子错误
#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    Failed(Box<dyn std::error::Error + Send + Sync>),

    #[error("钩子发生 panic: {message}\n{backtrace}")]
    Panicked { message: String, backtrace: String },

    #[error("钩子执行超时: {after:?}")]
    TimedOut { after: Duration },
}

impl From<anyhow::Error> for HookError {
    fn from(error: anyhow::Error) -> Self {
        Self::Failed(error.into())
    }
}

/// 单个组件的停止失败记录
#[derive(Debug)]
pub struct StopFailure {
    /// 组件标识
    pub component: String,
    /// 失败原因
    pub error: HookError,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.error)
    }
}

/// 生命周期错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("组件 {component} 初始化失败: {source}")]
    InitFailed {
        component: String,
        #[source]
        source: HookError,
    },

    #[error("组件 {component} 启动失败: {source}{}", rollback_summary(.rollback))]
    StartFailed {
        component: String,
        #[source]
        source: HookError,
        rollback: Vec<StopFailure>,
    },

    #[error("{} 个组件停止失败: {}", .failures.len(), join_failures(.failures))]
    StopFailed { failures: Vec<StopFailure> },

    #[error("容器状态为 {state} 时不能执行 {operation}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
}

fn join_failures(failures: &[StopFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn rollback_summary(rollback: &[StopFailure]) -> String {
    if rollback.is_empty() {
        String::new()
    } else {
        format!(" (回滚时另有 {} 个组件停止失败: {})", rollback.len(), join_failures(rollback))
    }
}

/// 加载器错误
///
/// 同一个加载器的所有调用方拿到的是同一个错误实例。
#[derive(Error, Debug, Clone)]
#[error("加载器 {loader} 执行失败: {source}")]
pub struct LoadError {
    /// 加载器名称
    pub loader: String,
    /// 原始错误
    pub source: Arc<DependencyError>,
}

/// 基础设施错误类型（顶层错误）
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("依赖注入错误: {0}")]
    Dependency(#[from] DependencyError),

    #[error("生命周期错误: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("加载错误: {0}")]
    Load(#[from] LoadError),

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
