//! 配置协作者接口

use crate::binder::decode;
use infrastructure_common::ConfigResult;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 配置源 trait
///
/// 不同后端（properties 文件、分层 YAML/环境变量等）只需实现这一个接口即可互换。
pub trait Configure: Send + Sync {
    /// 读取原始配置值，不存在时返回 `Ok(None)`
    ///
    /// 当 `key` 是某组键的公共前缀时，后端应返回由这些键组装出的对象。
    fn get_value(&self, key: &str) -> ConfigResult<Option<Value>>;

    /// 配置源名称
    fn name(&self) -> &str;
}

/// 类型化读取扩展
pub trait ConfigureExt: Configure {
    /// 读取并解码配置，键不存在时解析 `default` 字面量
    fn get<T>(&self, key: &str, default: &str) -> ConfigResult<T>
    where
        T: DeserializeOwned + 'static,
    {
        decode(self, key, Some(default))
    }

    /// 读取配置写入 `destination`
    fn get_into<T>(&self, key: &str, destination: &mut T, default: &str) -> ConfigResult<()>
    where
        T: DeserializeOwned + 'static,
    {
        *destination = self.get(key, default)?;
        Ok(())
    }

    /// 读取可选配置
    fn get_optional<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: DeserializeOwned + 'static,
    {
        match self.get_value(key)? {
            Some(_) => decode(self, key, None).map(Some),
            None => Ok(None),
        }
    }
}

impl<C: Configure + ?Sized> ConfigureExt for C {}
