//! Session state shared by every request the client makes.
//!
//! A [`Session`] is created on login (or a social-auth callback), has its token
//! pair replaced whenever a refresh succeeds, and is destroyed on logout,
//! account deletion, or a refresh that fails for good.

mod handle;
mod store;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub use handle::SessionHandle;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

#[cfg(test)]
pub use store::MockSessionStore;

/// Role value the backend assigns to back-office users.
pub const ADMIN_ROLE: &str = "ADMIN";

/// The persisted login state.
///
/// Field names on disk match the storage keys the web front end uses
/// (`Authorization`, `RefreshToken`, `userRole`), so a session exported
/// from a browser can be dropped in as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "Authorization")]
    pub access_token: String,
    #[serde(rename = "RefreshToken")]
    pub refresh_token: String,
    #[serde(rename = "userRole", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

impl From<TokenPair> for Session {
    fn from(pair: TokenPair) -> Self {
        Session::new(pair.access_token, pair.refresh_token)
    }
}

/// Access/refresh token pair as returned by the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Extracts the token pair a social-auth provider hands back on its
    /// redirect URL (`?accessToken=...&refreshToken=...`).
    pub fn from_callback_url(url: &str) -> Result<Self> {
        let url = Url::parse(url).context("Invalid callback URL")?;

        let mut access_token = None;
        let mut refresh_token = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "accessToken" => access_token = Some(value.into_owned()),
                "refreshToken" => refresh_token = Some(value.into_owned()),
                _ => {}
            }
        }

        match (access_token, refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(TokenPair::new(access, refresh))
            }
            _ => anyhow::bail!(
                "Callback URL must carry both accessToken and refreshToken query parameters"
            ),
        }
    }
}

/// Shortens a token for log output, keeping at most four characters on each end.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
