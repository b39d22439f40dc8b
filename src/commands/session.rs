use anyhow::{Context, Result};
use log::debug;

use crate::{
    api::{auth, user::fetch_profile},
    config::Config,
    runtime::Runtime,
    session::TokenPair,
};

/// How the user proves who they are.
#[derive(Debug, Clone)]
pub enum LoginMethod {
    Password { username: String, password: String },
    /// Redirect URL from a social-auth provider carrying the token pair.
    Callback { url: String },
}

#[tracing::instrument(skip(config, method))]
pub async fn login<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    method: LoginMethod,
) -> Result<()> {
    let client = config.connect()?;

    let session = match method {
        LoginMethod::Password { username, password } => {
            auth::login(&client, &username, &password).await?
        }
        LoginMethod::Callback { url } => {
            let pair = TokenPair::from_callback_url(&url)?;
            auth::complete_callback(&client, pair).await?
        }
    };

    match session.role.as_deref() {
        Some(role) => println!("Logged in ({}).", role),
        None => println!("Logged in."),
    }
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn logout<R: Runtime + Clone + 'static>(config: &Config<R>) -> Result<()> {
    let client = config.connect()?;
    if !client.session().is_logged_in().await {
        println!("Not logged in.");
        return Ok(());
    }

    auth::logout(&client).await?;
    println!("Logged out.");
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn delete_account<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    yes: bool,
) -> Result<()> {
    let client = config.connect()?;
    if !client.session().is_logged_in().await {
        anyhow::bail!("Not logged in. Run `bookshelf login` first.");
    }

    if !yes
        && !config
            .runtime
            .confirm("Really delete your account? This cannot be undone.")?
    {
        debug!("Account deletion cancelled by user");
        println!("Cancelled.");
        return Ok(());
    }

    auth::delete_account(&client).await?;
    println!("Account deleted.");
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn whoami<R: Runtime + Clone + 'static>(config: &Config<R>) -> Result<()> {
    let client = config.connect()?;
    if !client.session().is_logged_in().await {
        anyhow::bail!("Not logged in. Run `bookshelf login` first.");
    }

    let profile = fetch_profile(&client).await?;
    let json = serde_json::to_string_pretty(&profile).context("Failed to format profile")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::session::{FileSessionStore, Session, SessionStore};
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn config_at(server: &mockito::Server, dir: &TempDir) -> Config<RealRuntime> {
        Config::new(
            RealRuntime,
            Some(server.url()),
            Some(dir.path().join("session.json")),
        )
        .unwrap()
    }

    fn stored(dir: &TempDir) -> Option<Session> {
        FileSessionStore::new(RealRuntime, dir.path().join("session.json"))
            .load()
            .unwrap()
    }

    fn seed(dir: &TempDir, session: Session) {
        FileSessionStore::new(RealRuntime, dir.path().join("session.json"))
            .save(&session)
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_with_password_persists_session() {
        let mut server = mockito::Server::new_async().await;
        let _login = server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(r#"{"accessToken": "A1", "refreshToken": "R1"}"#)
            .create_async()
            .await;
        let _profile = server
            .mock("GET", "/api/user")
            .with_status(200)
            .with_body(r#"{"role": "USER"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let config = config_at(&server, &dir);
        login(
            &config,
            LoginMethod::Password {
                username: "reader".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            stored(&dir),
            Some(Session::new("A1", "R1").with_role("USER"))
        );
    }

    #[tokio::test]
    async fn test_login_with_callback_url() {
        let mut server = mockito::Server::new_async().await;
        let _profile = server
            .mock("GET", "/api/user")
            .match_header("Authorization", "KA")
            .with_status(200)
            .with_body(r#"{"role": "USER"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let config = config_at(&server, &dir);
        login(
            &config,
            LoginMethod::Callback {
                url: "http://localhost:3000/oauth/callback?accessToken=KA&refreshToken=KR"
                    .to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            stored(&dir),
            Some(Session::new("KA", "KR").with_role("USER"))
        );
    }

    #[tokio::test]
    async fn test_logout_when_not_logged_in_is_noop() {
        let server = mockito::Server::new_async().await;
        let dir = tempdir().unwrap();
        logout(&config_at(&server, &dir)).await.unwrap();
        assert_eq!(stored(&dir), None);
    }

    #[tokio::test]
    async fn test_delete_account_declined() {
        let mut server = mockito::Server::new_async().await;
        let signout = server
            .mock("DELETE", "/api/auth/signout")
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        seed(&dir, Session::new("A1", "R1"));

        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|p| p.exists());
        runtime
            .expect_read_to_string()
            .returning(|p| Ok(std::fs::read_to_string(p)?));
        runtime.expect_confirm().times(1).returning(|_| Ok(false));

        let config = Config::new(
            Arc::new(runtime),
            Some(server.url()),
            Some(dir.path().join("session.json")),
        )
        .unwrap();
        delete_account(&config, false).await.unwrap();

        signout.assert_async().await;
        assert_eq!(stored(&dir), Some(Session::new("A1", "R1")));
    }

    #[tokio::test]
    async fn test_delete_account_confirmed_by_flag() {
        let mut server = mockito::Server::new_async().await;
        let signout = server
            .mock("DELETE", "/api/auth/signout")
            .match_header("Authorization", "A1")
            .with_status(200)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        seed(&dir, Session::new("A1", "R1"));
        delete_account(&config_at(&server, &dir), true)
            .await
            .unwrap();

        signout.assert_async().await;
        assert_eq!(stored(&dir), None);
    }

    #[tokio::test]
    async fn test_whoami_requires_login() {
        let server = mockito::Server::new_async().await;
        let dir = tempdir().unwrap();
        let err = whoami(&config_at(&server, &dir)).await.unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[tokio::test]
    async fn test_whoami_prints_profile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/user")
            .match_header("Authorization", "A1")
            .with_status(200)
            .with_body(r#"{"username": "reader", "role": "USER"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        seed(&dir, Session::new("A1", "R1"));
        whoami(&config_at(&server, &dir)).await.unwrap();
        mock.assert_async().await;
    }
}
