use reqwest::Url;

use crate::config::ProviderConfig;
use crate::error::CrmlinkError;

use super::state::pack_state;

/// Build the provider authorization URL the user is redirected to.
pub fn build_authorization_url(
    provider: &ProviderConfig,
    user_id: &str,
    org_id: &str,
) -> Result<String, CrmlinkError> {
    let mut url = Url::parse(&provider.authorize_url).map_err(|e| CrmlinkError::InvalidUrl {
        url: provider.authorize_url.clone(),
        detail: e.to_string(),
    })?;

    url.query_pairs_mut()
        .append_pair("client_id", &provider.client_id)
        .append_pair("redirect_uri", &provider.redirect_uri)
        .append_pair("scope", &provider.scopes.join(" "))
        .append_pair("response_type", "code")
        .append_pair("state", &pack_state(user_id, org_id));

    Ok(url.into())
}
