//! Error taxonomy surfaced by the authenticated client.

use reqwest::{Response, StatusCode};

/// Statuses that mean "your access token was not accepted".
pub const DEFAULT_AUTH_FAILURE_STATUSES: [StatusCode; 2] =
    [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN];

/// Errors returned by [`AuthClient`](super::AuthClient).
#[derive(Debug)]
pub enum ClientError {
    /// The token refresh was attempted and failed; the session has been cleared.
    AuthExpired(String),
    /// The refresh this request was waiting on was dropped before it finished.
    RefreshAbandoned,
    /// Authorization was rejected and could not be recovered (no session, or
    /// the request was already replayed once).
    Forbidden { status: u16, path: String },
    /// No response was received.
    Network(reqwest::Error),
    /// Any other non-success status, passed through for the caller.
    Unhandled {
        status: u16,
        path: String,
        body: String,
    },
    /// The body could not be encoded or decoded as the expected JSON.
    Decode { path: String, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::AuthExpired(msg) => {
                write!(f, "Session expired: {}. Please log in again.", msg)
            }
            ClientError::RefreshAbandoned => {
                write!(f, "Session refresh was interrupted before it completed")
            }
            ClientError::Forbidden { status, path } => {
                write!(f, "Access to {} was rejected (HTTP {})", path, status)
            }
            ClientError::Network(e) => write!(f, "Network error: {}", e),
            ClientError::Unhandled { status, path, body } => {
                if body.is_empty() {
                    write!(f, "Request to {} failed with HTTP {}", path, status)
                } else {
                    write!(f, "Request to {} failed with HTTP {}: {}", path, status, body)
                }
            }
            ClientError::Decode { path, message } => {
                write!(f, "Unexpected response body from {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl ClientError {
    /// HTTP status behind this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Forbidden { status, .. } | ClientError::Unhandled { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ClientError::AuthExpired(_))
    }

    pub(crate) async fn unhandled(path: &str, response: Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ClientError::Unhandled {
            status,
            path: path.to_string(),
            body,
        }
    }
}

/// How the interceptor treats a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx/3xx: handed to the caller untouched.
    Passthrough,
    /// The access token was rejected; eligible for one refresh-and-replay.
    AuthRejected,
    /// Everything else.
    Failed,
}

/// Classifies a status against the configured auth-failure set.
pub fn classify_status(status: StatusCode, auth_failure_statuses: &[StatusCode]) -> StatusClass {
    if status.is_success() || status.is_redirection() {
        StatusClass::Passthrough
    } else if auth_failure_statuses.contains(&status) {
        StatusClass::AuthRejected
    } else {
        StatusClass::Failed
    }
}
