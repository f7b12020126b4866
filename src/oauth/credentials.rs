use crate::error::CrmlinkError;
use crate::store::{credential_key, KeyValueStore};

/// Look up the raw credential blob stored for `user_id` in `org_id`.
pub async fn get_credentials(
    store: &dyn KeyValueStore,
    provider: &str,
    user_id: &str,
    org_id: &str,
) -> Result<String, CrmlinkError> {
    let key = credential_key(provider, org_id, user_id);
    match store.get(&key).await? {
        Some(blob) if !blob.is_empty() => Ok(blob),
        _ => Err(CrmlinkError::CredentialsNotFound {
            provider: provider.to_string(),
        }),
    }
}
