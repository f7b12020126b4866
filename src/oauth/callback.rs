use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::config::{CrmlinkConfig, ProviderConfig};
use crate::error::CrmlinkError;
use crate::http::build_client;
use crate::store::{credential_key, KeyValueStore};

use super::state::parse_state;
use super::token::exchange_code;

/// Page returned to the OAuth popup; it closes itself so the opener can
/// notice and pick up the stored credentials.
pub const CLOSE_WINDOW_HTML: &str = "<html>\n    <script>\n        window.close();\n    </script>\n</html>\n";

const MAX_REQUEST_BYTES: usize = 16 * 1024;
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles the provider's redirect back to `redirect_uri`.
pub struct CallbackHandler {
    provider: ProviderConfig,
    store: Arc<dyn KeyValueStore>,
    credential_ttl: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for CallbackHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandler")
            .field("provider", &self.provider.name)
            .field("token_url", &self.provider.token_url)
            .field("credential_ttl", &self.credential_ttl)
            .finish_non_exhaustive()
    }
}

impl CallbackHandler {
    pub fn new(config: &CrmlinkConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, CrmlinkError> {
        Ok(Self {
            provider: config.provider.clone(),
            store,
            credential_ttl: config.credential_ttl(),
            client: build_client(config.request_timeout())?,
        })
    }

    /// Validate the redirect query, exchange the code and persist the token
    /// response under the caller's credential key.
    ///
    /// Nothing is written to the store unless every step succeeds.
    pub async fn handle(&self, query: &HashMap<String, String>) -> Result<String, CrmlinkError> {
        let code = query
            .get("code")
            .filter(|code| !code.is_empty())
            .ok_or(CrmlinkError::MissingCode)?;
        let (user_id, org_id) = parse_state(query.get("state").map(String::as_str))?;

        let token = exchange_code(&self.client, &self.provider, code).await?;

        let key = credential_key(&self.provider.name, &org_id, &user_id);
        let blob = serde_json::to_string(&token)?;
        self.store
            .set(&key, &blob, Some(self.credential_ttl))
            .await?;
        tracing::info!(
            provider = %self.provider.name,
            user_id = %user_id,
            org_id = %org_id,
            ttl_secs = self.credential_ttl.as_secs(),
            "stored credentials"
        );

        Ok(CLOSE_WINDOW_HTML.to_string())
    }

    /// Path component of the configured redirect URI.
    pub fn callback_path(&self) -> Result<String, CrmlinkError> {
        Ok(parse_redirect_uri(&self.provider.redirect_uri)?
            .path()
            .to_string())
    }
}

fn parse_redirect_uri(redirect_uri: &str) -> Result<Url, CrmlinkError> {
    Url::parse(redirect_uri).map_err(|e| CrmlinkError::InvalidUrl {
        url: redirect_uri.to_string(),
        detail: e.to_string(),
    })
}

/// Port the redirect URI points at, used to pick the local listen port.
pub fn redirect_port(redirect_uri: &str) -> Result<u16, CrmlinkError> {
    let url = parse_redirect_uri(redirect_uri)?;
    url.port_or_known_default()
        .ok_or_else(|| CrmlinkError::InvalidUrl {
            url: redirect_uri.to_string(),
            detail: "no port".to_string(),
        })
}

/// Bind `127.0.0.1:{port}` and serve a single OAuth redirect.
pub async fn listen_for_callback(
    handler: &CallbackHandler,
    port: u16,
    timeout: Duration,
) -> Result<(), CrmlinkError> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(port, "waiting for OAuth callback");
    serve_callback(handler, listener, timeout).await
}

/// Accept connections until one hits the callback path, answer it with the
/// handler's page (or a JSON error), and return the handler's outcome.
///
/// Request heads are read concurrently, each under its own short timeout, so
/// an idle or broken connection cannot hold up the redirect. Requests for
/// other paths, such as a browser's favicon request, get a 404.
pub async fn serve_callback(
    handler: &CallbackHandler,
    listener: TcpListener,
    timeout: Duration,
) -> Result<(), CrmlinkError> {
    let callback_path = handler.callback_path()?;

    let accept_loop = async {
        let mut pending = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        pending.spawn(read_request(stream, peer));
                    }
                    Err(e) => tracing::debug!("accept failed: {e}"),
                },
                Some(joined) = pending.join_next() => {
                    let Ok((mut stream, peer, target)) = joined else {
                        continue;
                    };
                    let target = match target {
                        Ok(target) => target,
                        Err(e) => {
                            tracing::debug!(%peer, "dropping connection: {e}");
                            continue;
                        }
                    };
                    let Some((path, query)) = target.as_deref().and_then(split_target) else {
                        reply(&mut stream, StatusCode::BAD_REQUEST, "text/plain", "Bad request").await;
                        continue;
                    };
                    if path != callback_path {
                        tracing::debug!(%peer, path = %path, "ignoring non-callback request");
                        reply(&mut stream, StatusCode::NOT_FOUND, "text/plain", "Not found").await;
                        continue;
                    }

                    let outcome: Result<(), CrmlinkError> = match handler.handle(&query).await {
                        Ok(html) => {
                            reply(&mut stream, StatusCode::OK, "text/html", &html).await;
                            Ok(())
                        }
                        Err(e) => {
                            tracing::warn!(code = e.code(), "OAuth callback failed: {e}");
                            let status = StatusCode::from_u16(e.status())
                                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                            let body = e.to_json().to_string();
                            reply(&mut stream, status, "application/json", &body).await;
                            Err(e)
                        }
                    };
                    return outcome;
                }
            }
        }
    };

    tokio::time::timeout(timeout, accept_loop)
        .await
        .map_err(|_| CrmlinkError::CallbackTimeout(timeout))?
}

/// Read one request head under [`REQUEST_READ_TIMEOUT`], handing the stream
/// back so the caller can answer on it.
async fn read_request(
    mut stream: TcpStream,
    peer: SocketAddr,
) -> (TcpStream, SocketAddr, Result<Option<String>, CrmlinkError>) {
    let read = tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_target(&mut stream));
    let target = match read.await {
        Ok(target) => target,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "no request received",
        )
        .into()),
    };
    (stream, peer, target)
}

/// Write a response; a client that has gone away is only logged.
async fn reply(stream: &mut TcpStream, status: StatusCode, content_type: &str, body: &str) {
    if let Err(e) = write_response(stream, status, content_type, body).await {
        tracing::debug!("failed to write {status} response: {e}");
    }
}

/// Read the request head and return the request-target of its first line.
/// A head cut off before its blank line yields `None`.
async fn read_request_target(stream: &mut TcpStream) -> Result<Option<String>, CrmlinkError> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    let complete = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break false;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break true;
        }
        if buf.len() >= MAX_REQUEST_BYTES {
            break false;
        }
    };
    if !complete {
        return Ok(None);
    }

    let request = String::from_utf8_lossy(&buf);
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_string);
    Ok(target)
}

/// Split `"/path?query"` into the path and its decoded query parameters.
/// Later duplicates of a parameter win.
fn split_target(target: &str) -> Option<(String, HashMap<String, String>)> {
    let url = Url::parse("http://localhost").ok()?.join(target).ok()?;
    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    Some((url.path().to_string(), query))
}

async fn write_response(
    stream: &mut TcpStream,
    status: StatusCode,
    content_type: &str,
    body: &str,
) -> Result<(), CrmlinkError> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {content_type}; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        body.len(),
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}
