//! 内存配置源

use config_abstractions::Configure;
use infrastructure_common::ConfigResult;
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// 内存配置源
///
/// 键按 `.` 分段写入嵌套对象，适合测试和嵌入式场景。
#[derive(Debug, Default)]
pub struct InMemoryConfigure {
    root: RwLock<Map<String, Value>>,
}

impl InMemoryConfigure {
    /// 创建空配置源
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个值后返回自身
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// 写入一个值
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let mut root = self.root.write();
        let mut current = &mut *root;
        let mut segments = key.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), value.into());
                return;
            }
            let child = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            match child {
                Value::Object(map) => current = map,
                _ => return,
            }
        }
    }
}

impl Configure for InMemoryConfigure {
    fn get_value(&self, key: &str) -> ConfigResult<Option<Value>> {
        let root = self.root.read();
        let mut segments = key.split('.');
        let Some(first) = segments.next() else {
            return Ok(None);
        };
        let mut current = root.get(first);
        for segment in segments {
            current = current.and_then(|value| value.get(segment));
        }
        Ok(current.cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
