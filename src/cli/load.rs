use std::io::IsTerminal;

use crate::config::CrmlinkConfig;
use crate::error::CrmlinkError;
use crate::items::ItemFetcher;
use crate::oauth::get_credentials;
use crate::store::open_store;

use super::output::{print_items, OutputMode};

/// Where `load` takes its credential blob from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Stored { user_id: String, org_id: String },
    Inline(String),
}

pub async fn run_credentials(
    config: &CrmlinkConfig,
    user_id: &str,
    org_id: &str,
) -> Result<(), CrmlinkError> {
    let store = open_store(&config.store)?;
    let blob = get_credentials(store.as_ref(), &config.provider.name, user_id, org_id).await?;
    println!("{blob}");
    Ok(())
}

pub async fn run_load(
    config: &CrmlinkConfig,
    source: CredentialSource,
    json: bool,
) -> Result<(), CrmlinkError> {
    let credentials = match source {
        CredentialSource::Inline(blob) => blob,
        CredentialSource::Stored { user_id, org_id } => {
            let store = open_store(&config.store)?;
            get_credentials(store.as_ref(), &config.provider.name, &user_id, &org_id).await?
        }
    };

    let items = ItemFetcher::new(config).fetch_items(&credentials).await?;
    let mode = if json { OutputMode::Json } else { OutputMode::Pretty };
    print_items(&items, mode, std::io::stdout().is_terminal());
    Ok(())
}
