use clap::{Parser, Subcommand};

use crmlink::cli::load::CredentialSource;

#[derive(Parser)]
#[command(name = "crmlink", version, about = "Connect to HubSpot over OAuth2 and load normalized CRM items")]
struct Cli {
    /// Path to a crmlink.json config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the provider authorization URL for a user
    Authorize {
        #[arg(long)]
        user: String,
        #[arg(long)]
        org: String,
    },

    /// Authorize in the browser and store the resulting credentials
    Connect {
        #[arg(long)]
        user: String,
        #[arg(long)]
        org: String,

        /// Local port for the OAuth redirect (defaults to the redirect URI's port)
        #[arg(long)]
        port: Option<u16>,

        /// OAuth timeout in milliseconds
        #[arg(long, env = "CRMLINK_OAUTH_TIMEOUT_MS")]
        timeout_ms: Option<u64>,
    },

    /// Print the stored credential blob for a user
    Credentials {
        #[arg(long)]
        user: String,
        #[arg(long)]
        org: String,
    },

    /// Fetch contacts, companies and deals as integration items
    Load {
        #[arg(long, requires = "org", conflicts_with = "credentials")]
        user: Option<String>,
        #[arg(long, requires = "user")]
        org: Option<String>,

        /// Raw credential blob instead of a stored one
        #[arg(long, required_unless_present = "user")]
        credentials: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CRMLINK_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = matches!(cli.command, Commands::Load { json: true, .. });

    if let Err(e) = run(cli).await {
        crmlink::cli::output::print_error(&e, json_mode);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), crmlink::CrmlinkError> {
    let config = crmlink::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Authorize { user, org } => {
            crmlink::cli::connect::run_authorize(&config, &user, &org)
        }
        Commands::Connect {
            user,
            org,
            port,
            timeout_ms,
        } => {
            let timeout = std::time::Duration::from_millis(timeout_ms.unwrap_or(120_000));
            crmlink::cli::connect::run_connect(&config, &user, &org, port, timeout).await
        }
        Commands::Credentials { user, org } => {
            crmlink::cli::load::run_credentials(&config, &user, &org).await
        }
        Commands::Load {
            user,
            org,
            credentials,
            json,
        } => {
            let source = match (credentials, user, org) {
                (Some(blob), _, _) => CredentialSource::Inline(blob),
                (None, Some(user_id), Some(org_id)) => CredentialSource::Stored { user_id, org_id },
                _ => {
                    return Err(crmlink::CrmlinkError::InvalidCredentials(
                        "pass --credentials or both --user and --org".to_string(),
                    ))
                }
            };
            crmlink::cli::load::run_load(&config, source, json).await
        }
    }
}
