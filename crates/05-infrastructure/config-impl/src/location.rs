//! 配置位置（环境名与配置目录）
//!
//! 通过命令行 `--env`/`-e` 与 `--conf`/`-c` 指定，兼容单横线的 `-env`/`-conf` 写法，
//! 未指定时读取 `LORN_ENV`/`LORN_CONF` 环境变量。

use clap::Parser;
use std::path::{Path, PathBuf};

/// 默认环境名
pub const DEFAULT_ENV: &str = "local";
/// 默认配置目录
pub const DEFAULT_CONF_DIR: &str = "config";
/// 环境变量覆盖使用的默认前缀
pub const DEFAULT_ENV_PREFIX: &str = "LORN";

/// 配置位置
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "lorn", disable_help_flag = true, disable_version_flag = true)]
pub struct ConfigLocation {
    /// 环境名，决定加载 `<conf>/<env>.*` 覆盖文件
    #[arg(short = 'e', long = "env", env = "LORN_ENV", default_value = DEFAULT_ENV)]
    pub env: String,

    /// 配置目录
    #[arg(short = 'c', long = "conf", env = "LORN_CONF", default_value = DEFAULT_CONF_DIR)]
    pub conf_dir: PathBuf,

    /// 环境变量覆盖前缀
    #[arg(skip = String::from(DEFAULT_ENV_PREFIX))]
    pub env_prefix: String,
}

impl Default for ConfigLocation {
    fn default() -> Self {
        Self {
            env: DEFAULT_ENV.to_string(),
            conf_dir: PathBuf::from(DEFAULT_CONF_DIR),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLocation {
    /// 创建配置位置
    pub fn new(env: impl Into<String>, conf_dir: impl Into<PathBuf>) -> Self {
        Self {
            env: env.into(),
            conf_dir: conf_dir.into(),
            ..Self::default()
        }
    }

    /// 设置环境变量前缀
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 从进程参数解析
    pub fn from_args() -> Self {
        Self::from_args_iter(std::env::args())
    }

    /// 从给定参数解析，忽略无关参数
    pub fn from_args_iter<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let relevant = select_location_args(args.into_iter().map(Into::into));
        Self::try_parse_from(relevant).unwrap_or_default()
    }

    /// 指定文件名在配置目录下的路径
    pub fn file(&self, stem: &str) -> PathBuf {
        self.conf_dir.join(stem)
    }

    /// 配置目录
    pub fn dir(&self) -> &Path {
        &self.conf_dir
    }
}

fn select_location_args(args: impl Iterator<Item = String>) -> Vec<String> {
    let mut args = args.peekable();
    let mut selected: Vec<String> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let arg = match arg.as_str() {
            "-env" => "--env".to_string(),
            "-conf" => "--conf".to_string(),
            _ if arg.starts_with("-env=") => format!("-{arg}"),
            _ if arg.starts_with("-conf=") => format!("-{arg}"),
            _ => arg,
        };

        let takes_value = matches!(arg.as_str(), "--env" | "-e" | "--conf" | "-c");
        let inline = arg.starts_with("--env=") || arg.starts_with("--conf=");
        if takes_value {
            if let Some(value) = args.next() {
                selected.push(arg);
                selected.push(value);
            }
        } else if inline {
            selected.push(arg);
        }
    }
    selected
}
