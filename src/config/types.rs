use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CrmlinkError;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/integrations/hubspot/oauth2callback";
pub const DEFAULT_CREDENTIAL_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmlinkConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Lifetime of a stored credential blob, independent of the token's own expiry.
    #[serde(default = "default_credential_ttl_secs")]
    pub credential_ttl_secs: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for CrmlinkConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            credential_ttl_secs: DEFAULT_CREDENTIAL_TTL_SECS,
            request_timeout_secs: None,
            store: StoreConfig::default(),
        }
    }
}

impl CrmlinkConfig {
    pub fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.credential_ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Reject configurations that cannot complete a token exchange.
    pub fn validate(&self) -> Result<(), CrmlinkError> {
        if self.provider.client_id.is_empty() {
            return Err(invalid("provider.clientId is not set (or HUBSPOT_CLIENT_ID)"));
        }
        if self.provider.client_secret.is_empty() {
            return Err(invalid(
                "provider.clientSecret is not set (or HUBSPOT_CLIENT_SECRET)",
            ));
        }
        Ok(())
    }
}

fn invalid(detail: &str) -> CrmlinkError {
    CrmlinkError::ConfigError {
        path: PathBuf::from("<config>"),
        detail: detail.to_string(),
    }
}

/// Client identity and endpoints of the OAuth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Base of the deep links written into `IntegrationItem::source_url`.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
            app_base_url: default_app_base_url(),
            scopes: default_scopes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

fn default_name() -> String {
    "hubspot".to_string()
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_authorize_url() -> String {
    "https://app.hubspot.com/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://api.hubapi.com/oauth/v1/token".to_string()
}

fn default_api_base_url() -> String {
    "https://api.hubapi.com".to_string()
}

fn default_app_base_url() -> String {
    "https://app.hubspot.com".to_string()
}

fn default_scopes() -> Vec<String> {
    [
        "crm.objects.contacts.read",
        "crm.objects.companies.read",
        "crm.objects.deals.read",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_credential_ttl_secs() -> u64 {
    DEFAULT_CREDENTIAL_TTL_SECS
}
