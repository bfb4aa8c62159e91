//! 分层配置源
//!
//! 基于 `config` crate，依次叠加 `<conf>/default.*`、`<conf>/<env>.*`（yaml/json/toml）
//! 以及 `<PREFIX>__SECTION__KEY` 形式的环境变量。

use crate::location::ConfigLocation;
use config::{Config, Environment, File, FileFormat};
use config_abstractions::Configure;
use infrastructure_common::{ConfigError, ConfigResult};
use serde_json::Value;
use tracing::{debug, error, info};

/// 分层配置源
#[derive(Debug, Clone)]
pub struct HierarchicalConfigure {
    name: String,
    settings: Config,
}

impl HierarchicalConfigure {
    /// 按配置位置加载
    pub fn load(location: &ConfigLocation) -> ConfigResult<Self> {
        let default_file = location.file("default");
        let env_file = location.file(&location.env);

        let settings = Config::builder()
            .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
            .add_source(File::with_name(&env_file.to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix(&location.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                error!("分层配置构建失败: {}", e);
                ConfigError::parse(e)
            })?;

        info!(
            "分层配置加载完成: 目录={}, 环境={}",
            location.dir().display(),
            location.env
        );
        Ok(Self {
            name: "hierarchical".to_string(),
            settings,
        })
    }

    /// 从 YAML 文本创建
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        Self::from_str(content, FileFormat::Yaml)
    }

    /// 从 TOML 文本创建
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Self::from_str(content, FileFormat::Toml)
    }

    fn from_str(content: &str, format: FileFormat) -> ConfigResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(content, format))
            .build()
            .map_err(ConfigError::parse)?;
        Ok(Self {
            name: "hierarchical".to_string(),
            settings,
        })
    }
}

impl Configure for HierarchicalConfigure {
    fn get_value(&self, key: &str) -> ConfigResult<Option<Value>> {
        match self.settings.get::<Value>(key) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => {
                debug!("配置键不存在: {}", key);
                Ok(None)
            }
            Err(e) => Err(ConfigError::parse(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
