use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    http::{AuthClient, DEFAULT_AUTH_FAILURE_STATUSES},
    runtime::Runtime,
    session::{FileSessionStore, SessionHandle},
};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const API_URL_ENV: &str = "BOOKSHELF_API_URL";
pub const SESSION_PATH_ENV: &str = "BOOKSHELF_SESSION";

const USER_AGENT: &str = "bookshelf-cli";

pub struct Config<R: Runtime + Clone> {
    pub runtime: R,
    pub client: Client,
    pub api_url: String,
    pub session_path: PathBuf,
    pub auth_failure_statuses: Vec<StatusCode>,
}

impl<R: Runtime + Clone + 'static> Config<R> {
    pub fn new(
        runtime: R,
        api_url: Option<String>,
        session_path: Option<PathBuf>,
    ) -> Result<Self> {
        let api_url = api_url
            .or_else(|| runtime.env_var(API_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let session_path = match session_path {
            Some(path) => path,
            None => match runtime.env_var(SESSION_PATH_ENV) {
                Ok(path) if !path.is_empty() => PathBuf::from(path),
                _ => default_session_path(&runtime)?,
            },
        };

        debug!(
            "Using API {} with session file {}",
            api_url,
            session_path.display()
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            runtime,
            client,
            api_url,
            session_path,
            auth_failure_statuses: DEFAULT_AUTH_FAILURE_STATUSES.to_vec(),
        })
    }

    /// Loads the persisted session and wires up an authenticated client.
    pub fn connect(&self) -> Result<AuthClient> {
        let store = FileSessionStore::new(self.runtime.clone(), self.session_path.clone());
        let session = SessionHandle::init(Arc::new(store))?;
        Ok(AuthClient::new(
            self.client.clone(),
            &self.api_url,
            session,
            Arc::new(self.runtime.clone()),
        )
        .with_auth_failure_statuses(self.auth_failure_statuses.clone()))
    }
}

/// `<config dir>/bookshelf/session.json`, falling back to `~/.bookshelf/session.json`.
#[tracing::instrument(skip(runtime))]
pub fn default_session_path<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Some(config_dir) = runtime.config_dir() {
        return Ok(config_dir.join("bookshelf").join("session.json"));
    }
    let home_dir = runtime
        .home_dir()
        .context("Could not find a config or home directory for the session file")?;
    Ok(home_dir.join(".bookshelf").join("session.json"))
}
