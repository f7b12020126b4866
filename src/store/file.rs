use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::CrmlinkError;

use super::memory::expiry_from_ttl;
use super::KeyValueStore;

/// `~/.crmlink/credentials.json`
pub fn default_store_path() -> Result<PathBuf, CrmlinkError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CrmlinkError::Store("Cannot determine home directory".to_string()))?;
    Ok(home.join(".crmlink").join("credentials.json"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    value: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// JSON-file backed store shared between CLI invocations.
///
/// The whole map is rewritten on every `set`; expired entries are pruned then.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, StoredEntry>, CrmlinkError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&data).map_err(|e| {
            CrmlinkError::Store(format!("Corrupt store file {}: {e}", self.path.display()))
        })
    }

    /// Write the map to a sibling temp file and rename it over the store, so
    /// readers never see a partial file. The file is owner-only on unix.
    fn write_entries(&self, entries: &BTreeMap<String, StoredEntry>) -> Result<(), CrmlinkError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(entries)?;
        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        write_private(&tmp, &data)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CrmlinkError> {
        let _guard = self.lock.lock().await;
        let now = Utc::now();
        let mut entries = self.read_entries()?;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: expiry_from_ttl(ttl)?,
            },
        );
        self.write_entries(&entries)?;
        tracing::debug!(path = %self.path.display(), key, "wrote store entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CrmlinkError> {
        let _guard = self.lock.lock().await;
        let entries = self.read_entries()?;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .map(|entry| entry.value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_from_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("credentials.json"));
        assert!(store.get("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let store = FileStore::new(&path);
        store
            .set("hubspot_credentials:o:u", "{\"access_token\":\"t\"}", Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        assert!(path.exists());

        // A second instance sees the same data.
        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("hubspot_credentials:o:u").await.unwrap().as_deref(),
            Some("{\"access_token\":\"t\"}")
        );
    }

    #[tokio::test]
    async fn expired_entries_are_hidden_and_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileStore::new(&path);
        store
            .set("short", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.get("short").await.unwrap().is_none());

        store.set("other", "w", None).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("\"short\""));
        assert!(raw.contains("\"other\""));
    }

    #[tokio::test]
    async fn set_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("credentials.json"));
        store.set("a", "1", None).await.unwrap();
        store.set("b", "2", None).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["credentials.json".to_string()]);
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileStore::new(&path);
        store.set("k", "secret", None).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = FileStore::new(&path);
        let err = store.get("k").await.unwrap_err();
        assert_eq!(err.code(), "store_error");
    }
}
