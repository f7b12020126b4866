use std::time::Duration;

use crate::error::CrmlinkError;

/// Build the HTTP client used for one OAuth or fetch session.
///
/// No timeout is applied unless one is configured.
pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, CrmlinkError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| CrmlinkError::Http {
        url: "<client>".to_string(),
        source: e,
    })
}
