use std::path::PathBuf;
use std::time::Duration;

/// Coarse classification of every [`CrmlinkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller must restart the flow (bad code, state or credentials).
    ClientInput,
    /// The OAuth or CRM API answered with a non-success status.
    Provider,
    /// Everything else: transport, serialization, storage, configuration.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClientInput => "client_input",
            ErrorKind::Provider => "provider",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrmlinkError {
    #[error("Missing authorization code")]
    MissingCode,

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Failed to retrieve access token")]
    MissingAccessToken,

    #[error("No {provider} credentials found")]
    CredentialsNotFound { provider: String },

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("{provider} API error ({status}): {body}")]
    Provider {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("Missing key '{0}' in provider record")]
    MissingKey(String),

    #[error("Invalid URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("Timed out waiting for OAuth callback after {0:?}")]
    CallbackTimeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CrmlinkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrmlinkError::MissingCode
            | CrmlinkError::InvalidState
            | CrmlinkError::MissingAccessToken
            | CrmlinkError::CredentialsNotFound { .. }
            | CrmlinkError::InvalidCredentials(_) => ErrorKind::ClientInput,
            CrmlinkError::Provider { .. } => ErrorKind::Provider,
            CrmlinkError::Http { .. }
            | CrmlinkError::MissingKey(_)
            | CrmlinkError::InvalidUrl { .. }
            | CrmlinkError::Store(_)
            | CrmlinkError::ConfigError { .. }
            | CrmlinkError::CallbackTimeout(_)
            | CrmlinkError::Serialization(_)
            | CrmlinkError::IoError(_) => ErrorKind::Internal,
        }
    }

    /// HTTP-like status code for the error.
    pub fn status(&self) -> u16 {
        match self {
            CrmlinkError::Provider { status, .. } => *status,
            other => match other.kind() {
                ErrorKind::ClientInput => 400,
                _ => 500,
            },
        }
    }

    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            CrmlinkError::MissingCode => "missing_code",
            CrmlinkError::InvalidState => "invalid_state",
            CrmlinkError::MissingAccessToken => "missing_access_token",
            CrmlinkError::CredentialsNotFound { .. } => "credentials_not_found",
            CrmlinkError::InvalidCredentials(_) => "invalid_credentials",
            CrmlinkError::Provider { .. } => "provider_error",
            CrmlinkError::Http { .. } => "http_error",
            CrmlinkError::MissingKey(_) => "missing_key",
            CrmlinkError::InvalidUrl { .. } => "invalid_url",
            CrmlinkError::Store(_) => "store_error",
            CrmlinkError::ConfigError { .. } => "config_error",
            CrmlinkError::CallbackTimeout(_) => "timeout",
            CrmlinkError::Serialization(_) => "serialization_error",
            CrmlinkError::IoError(_) => "io_error",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code(),
                "kind": self.kind().as_str(),
                "status": self.status(),
                "message": self.to_string(),
            }
        })
    }
}
