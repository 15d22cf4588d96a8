use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// 字符串键值存储，保存 JSON 序列化后的界面状态
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// 进程内存储，不落盘
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().map_err(|_| anyhow!("存储锁已损坏"))?;
        Ok(items.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().map_err(|_| anyhow!("存储锁已损坏"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().map_err(|_| anyhow!("存储锁已损坏"))?;
        items.remove(key);
        Ok(())
    }
}

/// 不可用存储：读取为空，写入直接丢弃
pub struct NoopStorage;

impl Storage for NoopStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
