//! 日志协作者
//!
//! 容器通过默认注册的 [`Logger`] 输出生命周期事件，未注册时退回到 [`TracingLogger`]。

use std::fmt;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// 分级日志接口
pub trait Logger: Send + Sync {
    /// 输出一条日志
    fn log(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// 基于 tracing 的内置日志实现
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "lorn::container", "{}", message),
            LogLevel::Info => tracing::info!(target: "lorn::container", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "lorn::container", "{}", message),
            LogLevel::Error => tracing::error!(target: "lorn::container", "{}", message),
        }
    }
}
