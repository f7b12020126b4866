use std::time::Duration;

use crate::config::CrmlinkConfig;
use crate::error::CrmlinkError;
use crate::oauth::{build_authorization_url, listen_for_callback, redirect_port, CallbackHandler};
use crate::store::open_store;

pub fn run_authorize(config: &CrmlinkConfig, user_id: &str, org_id: &str) -> Result<(), CrmlinkError> {
    let url = build_authorization_url(&config.provider, user_id, org_id)?;
    println!("{url}");
    Ok(())
}

/// Open the authorization page and wait for the redirect to land locally.
pub async fn run_connect(
    config: &CrmlinkConfig,
    user_id: &str,
    org_id: &str,
    port: Option<u16>,
    timeout: Duration,
) -> Result<(), CrmlinkError> {
    config.validate()?;
    let store = open_store(&config.store)?;
    let handler = CallbackHandler::new(config, store)?;
    let port = match port {
        Some(port) => port,
        None => redirect_port(&config.provider.redirect_uri)?,
    };

    let auth_url = build_authorization_url(&config.provider, user_id, org_id)?;
    if webbrowser::open(&auth_url).is_err() {
        tracing::warn!("Could not open browser automatically. Please visit:\n{auth_url}");
    }
    eprintln!("Waiting for {} authorization on port {port}...", config.provider.name);

    listen_for_callback(&handler, port, timeout).await?;
    println!(
        "Connected {} for user '{user_id}' in org '{org_id}'",
        config.provider.name
    );
    Ok(())
}
