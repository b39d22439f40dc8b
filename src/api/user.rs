use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{AuthClient, ClientError};

pub const PROFILE_PATH: &str = "/api/user";
pub const HASHTAGS_PATH: &str = "/api/user/hashtags";

/// The signed-in user's profile. Fields the client does not use are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct HashtagSelection<'a> {
    tags: &'a [String],
}

#[tracing::instrument(skip(client))]
pub async fn fetch_profile(client: &AuthClient) -> Result<Profile, ClientError> {
    client.get_json(PROFILE_PATH).await
}

/// The user's preferred hashtags. Empty until the user has picked some.
#[tracing::instrument(skip(client))]
pub async fn hashtags(client: &AuthClient) -> Result<Vec<Value>, ClientError> {
    client.get_json(HASHTAGS_PATH).await
}

/// Replaces the user's preferred hashtags.
#[tracing::instrument(skip(client))]
pub async fn set_hashtags(client: &AuthClient, tags: &[String]) -> Result<(), ClientError> {
    client
        .put_json(HASHTAGS_PATH, &HashtagSelection { tags })
        .await?;
    Ok(())
}
