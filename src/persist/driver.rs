//! Storage driver abstraction and the in-memory driver.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::StorageError;

/// Key-value backing store for persisted records.
///
/// Values are opaque UTF-8 documents; the gateway owns their format.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Short driver name for logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local driver. Clones share the same map, so several runtimes in
/// one process can act as separate instances over shared storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored entry.
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_entries() {
        let driver = MemoryDriver::new();
        let other = driver.clone();
        driver.set("a", "1").await.expect("set");
        assert_eq!(other.get("a").await.expect("get"), Some("1".to_string()));
        other.remove("a").await.expect("remove");
        other.remove("a").await.expect("remove missing");
        assert!(driver.snapshot().await.is_empty());
    }
}
