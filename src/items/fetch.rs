use std::time::Duration;

use serde_json::Value;

use crate::config::{CrmlinkConfig, ProviderConfig};
use crate::error::CrmlinkError;
use crate::http::build_client;
use crate::oauth::token::access_token;

use super::normalize::normalize_items;
use super::types::{IntegrationItem, ItemType};

/// One CRM object listing fetched per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub item_type: ItemType,
    /// Path relative to the API base, e.g. `/crm/v3/objects/contacts`.
    pub path: String,
    pub is_directory: bool,
}

impl Endpoint {
    pub fn crm_object(item_type: ItemType, object: &str) -> Self {
        Self {
            item_type,
            path: format!("/crm/v3/objects/{object}"),
            is_directory: false,
        }
    }
}

/// Contacts, companies and deals, in the order they are fetched.
pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::crm_object(ItemType::Contact, "contacts"),
        Endpoint::crm_object(ItemType::Company, "companies"),
        Endpoint::crm_object(ItemType::Deal, "deals"),
    ]
}

/// Fetches the first page of every endpoint and normalizes the results.
#[derive(Debug, Clone)]
pub struct ItemFetcher {
    provider: ProviderConfig,
    endpoints: Vec<Endpoint>,
    timeout: Option<Duration>,
}

impl ItemFetcher {
    pub fn new(config: &CrmlinkConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            endpoints: default_endpoints(),
            timeout: config.request_timeout(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Fetch and normalize items using a stored credential blob.
    ///
    /// A failing endpoint is logged and skipped; the caller only sees the
    /// items of the endpoints that succeeded, in endpoint order.
    pub async fn fetch_items(&self, credentials: &str) -> Result<Vec<IntegrationItem>, CrmlinkError> {
        let blob: Value = serde_json::from_str(credentials).map_err(|e| {
            CrmlinkError::InvalidCredentials(format!("credentials are not JSON: {e}"))
        })?;
        let token = access_token(&blob)
            .ok_or_else(|| CrmlinkError::InvalidCredentials("missing access token".to_string()))?;

        // One client per call; dropped with its connection pool on every return path.
        let client = build_client(self.timeout)?;
        let mut items = Vec::new();

        for endpoint in &self.endpoints {
            match self.fetch_endpoint(&client, token, endpoint).await {
                Ok(batch) => {
                    tracing::debug!(
                        item_type = %endpoint.item_type,
                        count = batch.len(),
                        "fetched items"
                    );
                    items.extend(batch);
                }
                Err(e) => {
                    tracing::warn!(
                        item_type = %endpoint.item_type,
                        code = e.code(),
                        "Failed to fetch {} data: {e}",
                        endpoint.item_type
                    );
                }
            }
        }

        tracing::info!(provider = %self.provider.name, count = items.len(), "retrieved integration items");
        for item in items.iter().take(5) {
            tracing::debug!(?item, "sample item");
        }

        Ok(items)
    }

    async fn fetch_endpoint(
        &self,
        client: &reqwest::Client,
        token: &str,
        endpoint: &Endpoint,
    ) -> Result<Vec<IntegrationItem>, CrmlinkError> {
        let url = format!(
            "{}{}",
            self.provider.api_base_url.trim_end_matches('/'),
            endpoint.path
        );
        let resp = client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CrmlinkError::Http {
                url: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CrmlinkError::Provider {
                provider: self.provider.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let page: Value = resp
            .json()
            .await
            .map_err(|e| CrmlinkError::Http { url, source: e })?;
        normalize_items(
            &page,
            &endpoint.item_type,
            endpoint.is_directory,
            &self.provider.app_base_url,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_order_and_paths() {
        let endpoints = default_endpoints();
        let paths: Vec<&str> = endpoints.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/crm/v3/objects/contacts",
                "/crm/v3/objects/companies",
                "/crm/v3/objects/deals"
            ]
        );
        assert_eq!(endpoints[0].item_type, ItemType::Contact);
        assert_eq!(endpoints[1].item_type, ItemType::Company);
        assert_eq!(endpoints[2].item_type, ItemType::Deal);
        assert!(endpoints.iter().all(|e| !e.is_directory));
    }

    #[tokio::test]
    async fn credentials_must_be_json_with_token() {
        let fetcher = ItemFetcher::new(&CrmlinkConfig::default());

        let err = fetcher.fetch_items("not json").await.unwrap_err();
        assert!(matches!(err, CrmlinkError::InvalidCredentials(_)));

        let err = fetcher
            .fetch_items(r#"{"refresh_token": "r"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CrmlinkError::InvalidCredentials(_)));
        assert_eq!(err.status(), 400);
    }

    #[tokio::test]
    async fn no_endpoints_yields_empty_list() {
        let fetcher = ItemFetcher::new(&CrmlinkConfig::default()).with_endpoints(vec![]);
        let items = fetcher
            .fetch_items(r#"{"access_token": "tok"}"#)
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
