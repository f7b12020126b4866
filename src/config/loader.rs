use std::path::{Path, PathBuf};

use crate::error::CrmlinkError;

use super::env::{apply_env_overrides, expand_provider_config};
use super::types::CrmlinkConfig;

pub const CONFIG_ENV_VAR: &str = "CRMLINK_CONFIG";

/// Strip JSONC comments (`//` line comments and `/* */` block comments).
/// Line breaks inside comments are kept so parse errors report stable line numbers.
pub fn strip_jsonc_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if in_string {
            result.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (ch, next) {
            ('"', _) => {
                in_string = true;
                result.push(ch);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    if c == '\n' {
                        result.push('\n');
                    }
                    prev = c;
                }
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Candidate config files in precedence order (highest first).
///
/// 1. `--config` CLI flag
/// 2. `CRMLINK_CONFIG` env var
/// 3. `./config/crmlink.json`
/// 4. `~/.crmlink/crmlink.json` or `~/.crmlink/crmlink.jsonc`
pub fn discover_config_files(cli_config: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = cli_config {
        candidates.push(PathBuf::from(path));
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(env_path));
    }
    candidates.push(PathBuf::from("./config/crmlink.json"));
    if let Some(home) = dirs::home_dir() {
        let dir = home.join(".crmlink");
        candidates.push(dir.join("crmlink.json"));
        candidates.push(dir.join("crmlink.jsonc"));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for path in candidates {
        if path.exists() && !files.contains(&path) {
            files.push(path);
        }
    }
    files
}

/// Load a single config file, stripping JSONC comments before parsing.
pub fn load_config_file(path: &Path) -> Result<CrmlinkConfig, CrmlinkError> {
    let content = std::fs::read_to_string(path).map_err(|e| CrmlinkError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {e}"),
    })?;

    let stripped = strip_jsonc_comments(&content);
    serde_json::from_str::<CrmlinkConfig>(&stripped).map_err(|e| CrmlinkError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {e}"),
    })
}

/// Load the highest-precedence config file, or defaults when none exists,
/// then expand environment references and apply the `HUBSPOT_*` overrides.
///
/// An explicit `--config` path that does not exist is an error rather than a
/// silent fall through to lower-precedence files.
pub fn load_config(cli_config: Option<&str>) -> Result<CrmlinkConfig, CrmlinkError> {
    if let Some(path) = cli_config {
        if !Path::new(path).exists() {
            return Err(CrmlinkError::ConfigError {
                path: PathBuf::from(path),
                detail: "File does not exist".to_string(),
            });
        }
    }

    let mut config = match discover_config_files(cli_config).first() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config_file(path)?
        }
        None => CrmlinkConfig::default(),
    };

    expand_provider_config(&mut config.provider)?;
    apply_env_overrides(&mut config.provider);
    Ok(config)
}
