pub mod file;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::types::{StoreBackend, StoreConfig};
use crate::error::CrmlinkError;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Opaque string key-value store with per-entry expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`. `None` means the entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>)
        -> Result<(), CrmlinkError>;

    /// Fetch the value under `key`; expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CrmlinkError>;
}

/// Composite key under which a provider credential blob is stored.
pub fn credential_key(provider: &str, org_id: &str, user_id: &str) -> String {
    format!("{provider}_credentials:{org_id}:{user_id}")
}

/// Build the store selected by the configuration.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, CrmlinkError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::File => {
            let path = match &config.path {
                Some(path) => path.clone(),
                None => file::default_store_path()?,
            };
            Ok(Arc::new(FileStore::new(path)))
        }
    }
}
