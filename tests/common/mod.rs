pub mod http_mock;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use crmlink::config::{CrmlinkConfig, ProviderConfig, StoreBackend, StoreConfig};
use crmlink::{CrmlinkError, KeyValueStore, MemoryStore};

/// Config pointing every provider endpoint at `base_uri` (a wiremock server).
#[allow(dead_code)]
pub fn mock_config(base_uri: &str) -> CrmlinkConfig {
    CrmlinkConfig {
        provider: ProviderConfig {
            client_id: "test-client".into(),
            client_secret: "test-secret".into(),
            redirect_uri: "http://127.0.0.1:8000/integrations/hubspot/oauth2callback".into(),
            authorize_url: format!("{base_uri}/oauth/authorize"),
            token_url: format!("{base_uri}/oauth/v1/token"),
            api_base_url: base_uri.to_string(),
            app_base_url: "https://app.hubspot.com".into(),
            ..ProviderConfig::default()
        },
        credential_ttl_secs: 3600,
        request_timeout_secs: Some(10),
        store: StoreConfig {
            backend: StoreBackend::Memory,
            path: None,
        },
    }
}

/// Write `config` as JSON into a temp dir, with a file store beside it.
#[allow(dead_code)]
pub fn temp_config_dir(config: &CrmlinkConfig) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config.clone();
    config.store = StoreConfig {
        backend: StoreBackend::File,
        path: Some(dir.path().join("credentials.json")),
    };
    let json = serde_json::to_string_pretty(&config).unwrap();
    std::fs::write(dir.path().join("crmlink.json"), json).unwrap();
    dir
}

#[allow(dead_code)]
pub fn store_path(dir: &Path) -> std::path::PathBuf {
    dir.join("credentials.json")
}

/// A store that records every write on top of an in-memory store.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub writes: Mutex<Vec<(String, String, Option<Duration>)>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(String, String, Option<Duration>)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CrmlinkError> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CrmlinkError> {
        self.inner.get(key).await
    }
}
