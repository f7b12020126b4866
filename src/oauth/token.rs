use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::CrmlinkError;

/// Exchange an authorization code for the provider's token response.
///
/// The full response document is returned untouched so it can be stored as
/// the credential blob; only the presence of `access_token` is checked.
pub async fn exchange_code(
    client: &reqwest::Client,
    provider: &ProviderConfig,
    code: &str,
) -> Result<Value, CrmlinkError> {
    let resp = client
        .post(&provider.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("redirect_uri", provider.redirect_uri.as_str()),
            ("code", code),
        ])
        .send()
        .await
        .map_err(|e| CrmlinkError::Http {
            url: provider.token_url.clone(),
            source: e,
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CrmlinkError::Provider {
            provider: provider.name.clone(),
            status: status.as_u16(),
            body,
        });
    }

    let token: Value = resp.json().await.map_err(|e| CrmlinkError::Http {
        url: provider.token_url.clone(),
        source: e,
    })?;

    if access_token(&token).is_none() {
        return Err(CrmlinkError::MissingAccessToken);
    }
    Ok(token)
}

/// The non-empty `access_token` string of a token document, if any.
pub fn access_token(token: &Value) -> Option<&str> {
    token
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
}
