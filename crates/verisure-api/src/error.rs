use thiserror::Error;

/// Top-level error type for the `verisure-api` crate.
///
/// Transport failures, non-200 statuses, undecodable bodies, and
/// protocol-level gaps (no installation, no giid) are kept apart so callers
/// can tell a rejected login from a dead network.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The caller's cancellation token fired before the request completed.
    #[error("Request cancelled")]
    Cancelled,

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Status ──────────────────────────────────────────────────────
    /// Any response other than HTTP 200.
    #[error("{operation}: {status} {reason}")]
    Status {
        operation: &'static str,
        status: u16,
        reason: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request payload could not be encoded. Raised before anything is sent.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    // ── Protocol ────────────────────────────────────────────────────
    /// The installation search returned an empty list.
    #[error("no installations found")]
    NoInstallations,

    /// The first installation record carries no string `giid`.
    #[error("no giid found")]
    MissingGiid,

    // ── Configuration ───────────────────────────────────────────────
    /// An endpoint set was built with no URLs.
    #[error("no candidate endpoints configured")]
    NoEndpoints,
}

impl Error {
    /// Returns `true` if the server refused the credentials during login.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::Status {
                operation: "login",
                status: 401 | 403,
                ..
            }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().as_ref().map(reqwest::StatusCode::as_u16),
            _ => None,
        }
    }
}
