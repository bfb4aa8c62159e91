//! 日志订阅者设置

use infrastructure_common::{InfrastructureError, InfrastructureResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 多行、带缩进，适合本地调试
    Pretty,
    /// 单行
    #[default]
    Compact,
    /// 每行一个 JSON 对象，供日志采集使用
    Json,
}

impl FromStr for LogFormat {
    type Err = InfrastructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(InfrastructureError::BootstrapFailed {
                message: format!("未知的日志格式: {other}"),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// 日志配置
///
/// `RUST_LOG` 设置时覆盖 `level`。
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// 输出事件所在模块
    pub show_target: bool,
    pub show_thread_ids: bool,
    /// 输出事件所在的源文件与行号
    pub show_source: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            show_target: true,
            show_thread_ids: false,
            show_source: false,
        }
    }
}

impl LoggingConfig {
    /// 本地调试：DEBUG 级别，多行输出，带线程与源码位置
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: true,
            show_source: true,
        }
    }

    /// 部署环境：INFO 级别，JSON 输出
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Json,
            show_target: false,
            show_thread_ids: false,
            show_source: false,
        }
    }

    /// 按配置环境名选择预设，`prod` 与 `production` 使用部署预设
    pub fn for_environment(env: &str) -> Self {
        match env {
            "prod" | "production" => Self::production(),
            _ => Self::development(),
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 初始化全局日志订阅者，进程内只能成功一次
    pub fn initialize(&self) -> InfrastructureResult<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy();
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_source)
            .with_line_number(self.show_source);

        match self.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成, 格式 {}", self.format);
        Ok(())
    }
}
