pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod items;
pub mod oauth;
pub mod store;

pub use config::{load_config, CrmlinkConfig, ProviderConfig};
pub use error::{CrmlinkError, ErrorKind};
pub use items::{IntegrationItem, ItemFetcher, ItemType};
pub use oauth::{build_authorization_url, get_credentials, CallbackHandler};
pub use store::{credential_key, KeyValueStore, MemoryStore};

/// Convenience: read the stored credentials for a user and fetch their items.
pub async fn load_items(
    config: &CrmlinkConfig,
    store: &dyn KeyValueStore,
    user_id: &str,
    org_id: &str,
) -> Result<Vec<IntegrationItem>, CrmlinkError> {
    let credentials = get_credentials(store, &config.provider.name, user_id, org_id).await?;
    ItemFetcher::new(config).fetch_items(&credentials).await
}
