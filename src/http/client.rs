//! HTTP client that attaches the session token and recovers once from an
//! expired token.

use log::{debug, info, warn};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::error::{
    ClientError, DEFAULT_AUTH_FAILURE_STATUSES, StatusClass, classify_status,
};
use super::gate::{RefreshFailure, RefreshGate, RefreshOutcome};
use super::refresh::{BackendRefresher, TokenRefresher};
use crate::runtime::Runtime;
use crate::session::{SessionHandle, mask_token};

/// Notice shown when the session cannot be renewed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Where the user is sent after the session expires.
pub const LOGIN_LOCATION: &str = "/login";

/// A request as issued by the caller, kept so it can be replayed.
#[derive(Debug, Clone)]
struct PendingRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    params: Vec<(String, String)>,
    retried: bool,
}

impl PendingRequest {
    fn new(method: Method, path: &str, body: Option<&Value>, params: &[(&str, &str)]) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            method,
            path,
            body: body.cloned(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            retried: false,
        }
    }
}

/// Authenticated client for the backend.
///
/// Every request carries the current access token verbatim in the
/// `Authorization` header. A response in the auth-failure set triggers at most
/// one refresh-and-replay per request; concurrent failures share a single
/// refresh call through [`RefreshGate`].
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    session: SessionHandle,
    runtime: Arc<dyn Runtime>,
    refresher: Arc<dyn TokenRefresher>,
    gate: Arc<RefreshGate>,
    auth_failure_statuses: Vec<StatusCode>,
}

impl AuthClient {
    pub fn new(
        client: Client,
        base_url: &str,
        session: SessionHandle,
        runtime: Arc<dyn Runtime>,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let refresher = Arc::new(BackendRefresher::new(client.clone(), &base_url));
        Self {
            client,
            base_url,
            session,
            runtime,
            refresher,
            gate: Arc::new(RefreshGate::new()),
            auth_failure_statuses: DEFAULT_AUTH_FAILURE_STATUSES.to_vec(),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn with_auth_failure_statuses(mut self, statuses: Vec<StatusCode>) -> Self {
        self.auth_failure_statuses = statuses;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Issues a request and returns the (possibly replayed) response.
    #[tracing::instrument(skip(self, body, params))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, &str)],
    ) -> Result<Response, ClientError> {
        let mut pending = PendingRequest::new(method, path, body, params);
        let token = self.session.access_token().await;
        let response = self.send(&pending, token.as_deref()).await?;
        self.intercept(&mut pending, token, response).await
    }

    /// Performs a GET request and deserializes the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_json_with_query(path, &[]).await
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path, None, query).await?;
        decode(path, response).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = encode(path, body)?;
        let response = self.request(Method::POST, path, Some(&body), &[]).await?;
        decode(path, response).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ClientError> {
        let body = encode(path, body)?;
        self.request(Method::PUT, path, Some(&body), &[]).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ClientError> {
        let body = encode(path, body)?;
        self.request(Method::PATCH, path, Some(&body), &[]).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.request(Method::DELETE, path, None, &[]).await
    }

    async fn send(
        &self,
        request: &PendingRequest,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            match HeaderValue::from_str(token) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    builder = builder.header(AUTHORIZATION, value);
                }
                Err(_) => warn!(
                    "Access token {} is not a valid header value; sending without it",
                    mask_token(token)
                ),
            }
        }

        builder.send().await.map_err(ClientError::Network)
    }

    /// Response interceptor: passes successes through, recovers one auth
    /// failure per request, maps everything else to [`ClientError`].
    async fn intercept(
        &self,
        request: &mut PendingRequest,
        sent_with: Option<String>,
        response: Response,
    ) -> Result<Response, ClientError> {
        let status = response.status();
        let eligible = classify_status(status, &self.auth_failure_statuses)
            == StatusClass::AuthRejected
            && !request.retried
            && self.session.is_logged_in().await;

        if !eligible {
            return self.settle(request, response).await;
        }

        debug!(
            "{} {} rejected with HTTP {}; renewing session",
            request.method, request.path, status
        );
        request.retried = true;

        let token = match self.gate.run(|| self.renew(sent_with)).await {
            Ok(token) => token,
            Err(RefreshFailure::Rejected(msg)) => return Err(ClientError::AuthExpired(msg)),
            Err(RefreshFailure::Abandoned) => return Err(ClientError::RefreshAbandoned),
        };

        debug!("Replaying {} {}", request.method, request.path);
        let replay = self.send(request, Some(&token)).await?;
        self.settle(request, replay).await
    }

    /// Final mapping of a response; never retries.
    async fn settle(
        &self,
        request: &PendingRequest,
        response: Response,
    ) -> Result<Response, ClientError> {
        let status = response.status();
        match classify_status(status, &self.auth_failure_statuses) {
            StatusClass::Passthrough => Ok(response),
            StatusClass::AuthRejected => Err(ClientError::Forbidden {
                status: status.as_u16(),
                path: request.path.clone(),
            }),
            StatusClass::Failed => Err(ClientError::unhandled(&request.path, response).await),
        }
    }

    /// Produces a fresh access token. Runs only as the gate's leader.
    async fn renew(&self, sent_with: Option<String>) -> RefreshOutcome {
        let Some(session) = self.session.current().await else {
            return Err(RefreshFailure::Rejected(
                "session ended while waiting to refresh".to_string(),
            ));
        };

        // A refresh that settled after this request went out already did the work.
        if sent_with.as_deref() != Some(session.access_token.as_str()) {
            debug!("Access token changed since the request was sent; reusing it");
            return Ok(session.access_token);
        }

        info!("Refreshing access token");
        match self.refresher.refresh(&session.refresh_token).await {
            Ok(pair) => match self.session.update_tokens(&pair).await {
                Ok(true) => {
                    debug!("Access token refreshed: {}", mask_token(&pair.access_token));
                    Ok(pair.access_token)
                }
                // logged out while the refresh was in flight
                Ok(false) => Err(RefreshFailure::Rejected(
                    "session ended during refresh".to_string(),
                )),
                Err(e) => {
                    warn!("Failed to persist refreshed session: {:#}", e);
                    Ok(pair.access_token)
                }
            },
            Err(e) => {
                warn!("Token refresh failed: {:#}", e);
                self.expire_session().await;
                Err(RefreshFailure::Rejected(format!("{:#}", e)))
            }
        }
    }

    async fn expire_session(&self) {
        if let Err(e) = self.session.clear().await {
            warn!("Failed to clear expired session: {:#}", e);
        }
        self.runtime.alert(SESSION_EXPIRED_MESSAGE);
        self.runtime.navigate(LOGIN_LOCATION);
    }
}

fn encode<B: Serialize + ?Sized>(path: &str, body: &B) -> Result<Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::Decode {
        path: path.to_string(),
        message: format!("failed to encode request body: {}", e),
    })
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ClientError> {
    response.json::<T>().await.map_err(|e| ClientError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}
