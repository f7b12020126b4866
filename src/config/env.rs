use std::iter::Peekable;
use std::str::Chars;

use crate::error::CrmlinkError;

use super::types::{ProviderConfig, DEFAULT_REDIRECT_URI};

pub const CLIENT_ID_VAR: &str = "HUBSPOT_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "HUBSPOT_CLIENT_SECRET";
pub const REDIRECT_URI_VAR: &str = "HUBSPOT_REDIRECT_URI";

/// Expand environment variable references in a string.
///
/// Supported syntaxes:
/// - `${VAR}` - replaced with env var value; error if unset
/// - `${VAR:-fallback}` - replaced with env var value, or fallback if unset or empty
/// - `$env:VAR` - same as `${VAR}`
pub fn expand_env_vars(input: &str) -> Result<String, CrmlinkError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            let mut found_close = false;
            for c in chars.by_ref() {
                if c == '}' {
                    found_close = true;
                    break;
                }
                var_expr.push(c);
            }
            if !found_close {
                return Err(env_error(&format!(
                    "Unclosed variable reference: ${{{var_expr}"
                )));
            }

            match var_expr.split_once(":-") {
                Some((name, fallback)) => match std::env::var(name) {
                    Ok(val) if !val.is_empty() => result.push_str(&val),
                    _ => result.push_str(fallback),
                },
                None => result.push_str(&lookup(&var_expr)?),
            }
            continue;
        }

        if consume_prefix(&mut chars, "env:") {
            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    var_name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                return Err(env_error("Empty variable name in $env: reference"));
            }
            result.push_str(&lookup(&var_name)?);
            continue;
        }

        result.push('$');
    }

    Ok(result)
}

fn consume_prefix(chars: &mut Peekable<Chars<'_>>, prefix: &str) -> bool {
    let ahead: String = chars.clone().take(prefix.len()).collect();
    if ahead != prefix {
        return false;
    }
    for _ in 0..prefix.chars().count() {
        chars.next();
    }
    true
}

fn lookup(name: &str) -> Result<String, CrmlinkError> {
    std::env::var(name)
        .map_err(|_| env_error(&format!("Environment variable '{name}' is not set")))
}

/// Expand environment variables in all string fields of a ProviderConfig.
pub fn expand_provider_config(config: &mut ProviderConfig) -> Result<(), CrmlinkError> {
    for field in [
        &mut config.name,
        &mut config.client_id,
        &mut config.client_secret,
        &mut config.redirect_uri,
        &mut config.authorize_url,
        &mut config.token_url,
        &mut config.api_base_url,
        &mut config.app_base_url,
    ] {
        *field = expand_env_vars(field)?;
    }
    for scope in &mut config.scopes {
        *scope = expand_env_vars(scope)?;
    }
    Ok(())
}

/// Fill client identity from the `HUBSPOT_*` variables.
///
/// The client id and secret only fill empty fields. The redirect URI variable
/// replaces the built-in default but not a value set explicitly in a file.
pub fn apply_env_overrides(config: &mut ProviderConfig) {
    if config.client_id.is_empty() {
        if let Ok(val) = std::env::var(CLIENT_ID_VAR) {
            config.client_id = val;
        }
    }
    if config.client_secret.is_empty() {
        if let Ok(val) = std::env::var(CLIENT_SECRET_VAR) {
            config.client_secret = val;
        }
    }
    if config.redirect_uri.is_empty() || config.redirect_uri == DEFAULT_REDIRECT_URI {
        match std::env::var(REDIRECT_URI_VAR) {
            Ok(val) if !val.is_empty() => config.redirect_uri = val,
            _ => config.redirect_uri = DEFAULT_REDIRECT_URI.to_string(),
        }
    }
}

fn env_error(detail: &str) -> CrmlinkError {
    CrmlinkError::ConfigError {
        path: std::path::PathBuf::from("<env>"),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_dollar_brace_var() {
        std::env::set_var("CRMLINK_TEST_VAR1", "hello");
        let result = expand_env_vars("prefix-${CRMLINK_TEST_VAR1}-suffix").unwrap();
        assert_eq!(result, "prefix-hello-suffix");
        std::env::remove_var("CRMLINK_TEST_VAR1");
    }

    #[test]
    fn expand_dollar_brace_unset_errors() {
        std::env::remove_var("CRMLINK_TEST_UNSET_XYZ");
        let err = expand_env_vars("${CRMLINK_TEST_UNSET_XYZ}").unwrap_err();
        assert!(err.to_string().contains("CRMLINK_TEST_UNSET_XYZ"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn expand_fallback_when_unset_or_empty() {
        std::env::remove_var("CRMLINK_TEST_FB_UNSET");
        assert_eq!(
            expand_env_vars("${CRMLINK_TEST_FB_UNSET:-default_val}").unwrap(),
            "default_val"
        );
        std::env::set_var("CRMLINK_TEST_FB_EMPTY", "");
        assert_eq!(
            expand_env_vars("${CRMLINK_TEST_FB_EMPTY:-fallback}").unwrap(),
            "fallback"
        );
        std::env::remove_var("CRMLINK_TEST_FB_EMPTY");
    }

    #[test]
    fn expand_env_colon_var() {
        std::env::set_var("CRMLINK_TEST_ENV_COLON", "envval");
        let result = expand_env_vars("secret-$env:CRMLINK_TEST_ENV_COLON/x").unwrap();
        assert_eq!(result, "secret-envval/x");
        std::env::remove_var("CRMLINK_TEST_ENV_COLON");
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(expand_env_vars("cost $5").unwrap(), "cost $5");
        assert_eq!(expand_env_vars("trailing$").unwrap(), "trailing$");
    }

    #[test]
    fn unclosed_reference_errors() {
        let err = expand_env_vars("${NOPE").unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn expand_provider_config_expands_endpoints() {
        std::env::set_var("CRMLINK_TEST_PC_API", "http://127.0.0.1:4010");
        std::env::set_var("CRMLINK_TEST_PC_SECRET", "s3cret");
        let mut cfg = ProviderConfig {
            client_secret: "$env:CRMLINK_TEST_PC_SECRET".into(),
            api_base_url: "${CRMLINK_TEST_PC_API}".into(),
            ..ProviderConfig::default()
        };
        expand_provider_config(&mut cfg).unwrap();
        assert_eq!(cfg.client_secret, "s3cret");
        assert_eq!(cfg.api_base_url, "http://127.0.0.1:4010");
        std::env::remove_var("CRMLINK_TEST_PC_API");
        std::env::remove_var("CRMLINK_TEST_PC_SECRET");
    }

    #[test]
    fn env_overrides_do_not_replace_explicit_values() {
        let mut cfg = ProviderConfig {
            client_id: "from-file".into(),
            redirect_uri: "http://localhost:9999/cb".into(),
            ..ProviderConfig::default()
        };
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.client_id, "from-file");
        assert_eq!(cfg.redirect_uri, "http://localhost:9999/cb");
    }
}
