//! Loopback redirect listener for the OAuth consent step.

use calsync_core::{SyncError, SyncResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::debug;

const SUCCESS_PAGE: &str = "HTTP/1.1 200 OK\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    Connection: close\r\n\
    \r\n\
    <html><body>\
    <h1>calsync is authorized</h1>\
    <p>You can close this window and return to the terminal.</p>\
    </body></html>";

const FAILURE_PAGE: &str = "HTTP/1.1 400 Bad Request\r\n\
    Content-Type: text/html; charset=utf-8\r\n\
    Connection: close\r\n\
    \r\n\
    <html><body>\
    <h1>Authorization failed</h1>\
    <p>Return to the terminal for details.</p>\
    </body></html>";

/// What the consent redirect delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub state: String,
}

/// A bound `127.0.0.1` listener waiting for one redirect.
pub struct LoopbackListener {
    listener: TcpListener,
    redirect_uri: String,
}

impl LoopbackListener {
    /// Bind on `port`; 0 lets the OS choose.
    pub async fn bind(port: u16) -> SyncResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| SyncError::auth_with("Failed to bind OAuth callback listener", e))?;

        let local = listener
            .local_addr()
            .map_err(|e| SyncError::auth_with("Failed to read callback listener address", e))?;

        Ok(LoopbackListener {
            listener,
            redirect_uri: format!("http://127.0.0.1:{}/", local.port()),
        })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Accept one request, answer the browser, and hand back the code.
    pub async fn accept_callback(self) -> SyncResult<AuthorizationCode> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| SyncError::auth_with("Failed to accept OAuth callback", e))?;
        debug!(%peer, "OAuth callback connection");

        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .await
            .map_err(|e| SyncError::auth_with("Failed to read OAuth callback request", e))?;

        let result = parse_callback(&request_line);

        let page = if result.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
        let mut stream = reader.into_inner();
        // The code is already in hand; a browser that hung up does not matter.
        if let Err(e) = stream.write_all(page.as_bytes()).await {
            debug!(error = %e, "could not answer OAuth callback");
        }
        if let Err(e) = stream.flush().await {
            debug!(error = %e, "could not flush OAuth callback response");
        }

        result
    }
}

/// Pull `code`/`state` (or the provider's `error`) out of a request line
/// such as `GET /?code=xxx&state=yyy HTTP/1.1`.
pub fn parse_callback(request_line: &str) -> SyncResult<AuthorizationCode> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| SyncError::auth("Invalid OAuth callback request"))?;

    let url = url::Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| SyncError::auth_with("Invalid OAuth callback URL", e))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(SyncError::auth(format!("Consent was not granted: {}", error)));
    }

    let code = param("code").ok_or_else(|| SyncError::auth("No code in OAuth callback"))?;

    Ok(AuthorizationCode {
        code,
        state: param("state").unwrap_or_default(),
    })
}
