//! Authenticated HTTP client with single-flight token refresh.

mod client;
mod error;
mod gate;
mod refresh;

pub use client::{AuthClient, LOGIN_LOCATION, SESSION_EXPIRED_MESSAGE};
pub use error::{ClientError, DEFAULT_AUTH_FAILURE_STATUSES, StatusClass, classify_status};
pub use gate::{RefreshFailure, RefreshGate, RefreshOutcome};
pub use refresh::{BackendRefresher, REFRESH_PATH, TokenRefresher};
