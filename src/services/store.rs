//! 持久化键值存储 - 业务能力层
//!
//! 许可状态只通过这里读写，不做事务隔离：默认只有一个进程在使用同一份存储。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AppResult;

/// 异步键值存储
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 读取键值，键不存在或值为 `null` 时返回 `None`
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>>;

    /// 写入键值，写入 `null` 表示清除
    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()>;
}

/// 以单个 JSON 文件持久化的存储
///
/// 每次写入都会先写临时文件再重命名，避免进程中途退出留下半个文件。
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, JsonValue>>,
}

impl JsonFileStore {
    /// 打开存储文件，文件不存在时从空状态开始
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!("存储文件不存在，将在首次写入时创建: {}", path.display());
            Map::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &Map<String, JsonValue>) -> AppResult<()> {
        let tmp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).filter(|v| !v.is_null()).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value);
        self.persist(&entries).await
    }
}

/// 内存存储，进程退出即丢失
#[derive(Default)]
pub struct MemoryStore {
    entries: StdMutex<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).filter(|v| !v.is_null()).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
