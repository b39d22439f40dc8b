//! Session lifecycle endpoints: login, social-auth callback, logout and
//! account deletion.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use super::user::fetch_profile;
use crate::http::AuthClient;
use crate::session::{Session, TokenPair};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const SIGNOUT_PATH: &str = "/api/auth/signout";

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Logs in with username and password and records the user's role.
#[tracing::instrument(skip(client, password))]
pub async fn login(client: &AuthClient, username: &str, password: &str) -> Result<Session> {
    let pair: TokenPair = client
        .post_json(LOGIN_PATH, &Credentials { username, password })
        .await
        .context("Invalid username or password")?;

    start_session(client, pair).await
}

/// Finishes a social-auth login from the token pair handed back by the provider.
#[tracing::instrument(skip(client, pair))]
pub async fn complete_callback(client: &AuthClient, pair: TokenPair) -> Result<Session> {
    start_session(client, pair).await
}

async fn start_session(client: &AuthClient, pair: TokenPair) -> Result<Session> {
    let session = client.session();
    session.establish(Session::from(pair)).await?;

    let profile = fetch_profile(client)
        .await
        .context("Failed to fetch profile for new session")?;
    match profile.role.as_deref() {
        Some(role) => session.set_role(role).await?,
        None => warn!("Profile carries no role; admin features will be unavailable"),
    }

    let current = session
        .current()
        .await
        .context("Session ended while logging in")?;
    info!(
        "Logged in{}",
        profile
            .username
            .as_deref()
            .map(|u| format!(" as {}", u))
            .unwrap_or_default()
    );
    Ok(current)
}

/// Ends the session on the backend, then locally.
#[tracing::instrument(skip(client))]
pub async fn logout(client: &AuthClient) -> Result<()> {
    client
        .delete(LOGOUT_PATH)
        .await
        .context("Failed to log out")?;
    client.session().clear().await
}

/// Deletes the account, then drops the local session.
#[tracing::instrument(skip(client))]
pub async fn delete_account(client: &AuthClient) -> Result<()> {
    client
        .delete(SIGNOUT_PATH)
        .await
        .context("Failed to delete account")?;
    client.session().clear().await
}
