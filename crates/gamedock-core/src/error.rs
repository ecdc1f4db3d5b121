// ── Core error types ──
//
// Consumer-facing errors from gamedock-core. These are NOT API-specific —
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<gamedock_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fetch failures ───────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    BackendUnreachable { url: String, reason: String },

    #[error("Fetch failed: {message}")]
    FetchFailed { message: String },

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gamedock_api::Error> for CoreError {
    fn from(err: gamedock_api::Error) -> Self {
        match err {
            gamedock_api::Error::Transport(ref e) => {
                if e.is_connect() || e.is_timeout() {
                    CoreError::BackendUnreachable {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::FetchFailed {
                        message: e.to_string(),
                    }
                }
            }
            gamedock_api::Error::NotFound(path) => CoreError::ObjectNotFound(path),
            gamedock_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            gamedock_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            gamedock_api::Error::Server { status, message } => CoreError::FetchFailed {
                message: format!("server rejected request (HTTP {status}): {message}"),
            },
            gamedock_api::Error::WebSocketConnect(reason)
            | gamedock_api::Error::WebSocketClosed { reason, .. } => {
                CoreError::BackendUnreachable {
                    url: String::new(),
                    reason,
                }
            }
            gamedock_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
