//! 类型化配置解码
//!
//! 字符串形式的值（properties 文件、环境变量、默认值字面量）会按目标类型宽松转换：
//! 数字、布尔、逗号分隔的序列，以及 humantime 格式的 `Duration`。

use crate::Configure;
use infrastructure_common::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::time::Duration;
use tracing::debug;

/// 从配置源读取 `key` 并解码为 `T`
///
/// 键不存在时使用 `default` 字面量；两者都没有时，只有能从 `null` 解码的类型
/// （如 `Option<T>`）才会成功，其余返回 [`ConfigError::KeyNotFound`]。
pub fn decode<C, T>(configure: &C, key: &str, default: Option<&str>) -> ConfigResult<T>
where
    C: Configure + ?Sized,
    T: DeserializeOwned + 'static,
{
    let raw = match configure.get_value(key)? {
        Some(value) => value,
        None => match default {
            Some(literal) => {
                debug!("配置键 {} 不存在, 使用默认值 {:?}", key, literal);
                Value::String(literal.to_string())
            }
            None => {
                return serde_json::from_value(Value::Null).map_err(|_| ConfigError::KeyNotFound {
                    key: key.to_string(),
                })
            }
        },
    };
    decode_value(key, raw)
}

/// 将原始配置值解码为 `T`
pub fn decode_value<T>(key: &str, raw: Value) -> ConfigResult<T>
where
    T: DeserializeOwned + 'static,
{
    if TypeId::of::<T>() == TypeId::of::<Duration>() {
        let duration = parse_duration(key, &raw)?;
        return cast(duration).ok_or_else(|| ConfigError::conversion(key, "Duration 转换失败"));
    }

    let first_error = match serde_json::from_value::<T>(raw.clone()) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Value::String(text) = &raw {
        if let Ok(value) = serde_json::from_str::<T>(text) {
            return Ok(value);
        }
        if text.contains(',') {
            let items = text.split(',').map(|item| coerce_scalar(item.trim())).collect();
            if let Ok(value) = serde_json::from_value::<T>(Value::Array(items)) {
                return Ok(value);
            }
        }
    }

    Err(ConfigError::conversion(key, first_error.to_string()))
}

/// 将字符串推断为最贴近的 JSON 标量
pub fn coerce_scalar(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(number) = text.parse::<i64>() {
        return Value::from(number);
    }
    if let Ok(number) = text.parse::<f64>() {
        if number.is_finite() {
            return Value::from(number);
        }
    }
    Value::String(text.to_string())
}

fn parse_duration(key: &str, raw: &Value) -> ConfigResult<Duration> {
    match raw {
        Value::String(text) => humantime::parse_duration(text.trim())
            .map_err(|e| ConfigError::conversion(key, format!("无效的时长 {text:?}: {e}"))),
        Value::Number(number) => number
            .as_u64()
            .map(Duration::from_secs)
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|secs| secs.is_finite() && *secs >= 0.0)
                    .map(Duration::from_secs_f64)
            })
            .ok_or_else(|| ConfigError::conversion(key, format!("无效的时长: {number}"))),
        other => Err(ConfigError::conversion(key, format!("无法将 {other} 解析为时长"))),
    }
}

fn cast<T: 'static, U: 'static>(value: U) -> Option<T> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed.downcast::<T>().ok().map(|value| *value)
}
