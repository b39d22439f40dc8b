//! Back-office listings and moderation endpoints.

use anyhow::{Context, Result};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::envelope::Listing;
use crate::http::AuthClient;

pub const NOTICE_PATH: &str = "/api/admin/post/notice";

/// Resources the back office lists page by page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminResource {
    Users,
    Hashtags,
    Contents,
    Posts,
}

impl AdminResource {
    pub fn page_path(&self) -> &'static str {
        match self {
            AdminResource::Users => "/api/admin/user/page",
            AdminResource::Hashtags => "/api/admin/hashtag/page",
            AdminResource::Contents => "/api/admin/contents/page",
            AdminResource::Posts => "/api/admin/post/page",
        }
    }

    /// Path of a single item, for resources the back office can delete.
    pub fn item_path(&self, id: u64) -> Option<String> {
        let base = match self {
            AdminResource::Users => return None,
            AdminResource::Hashtags => "/api/admin/hashtag",
            AdminResource::Contents => "/api/admin/contents",
            AdminResource::Posts => "/api/admin/post",
        };
        Some(format!("{}/{}", base, id))
    }
}

impl fmt::Display for AdminResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminResource::Users => write!(f, "users"),
            AdminResource::Hashtags => write!(f, "hashtags"),
            AdminResource::Contents => write!(f, "contents"),
            AdminResource::Posts => write!(f, "posts"),
        }
    }
}

impl FromStr for AdminResource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" | "user" => Ok(AdminResource::Users),
            "hashtags" | "hashtag" => Ok(AdminResource::Hashtags),
            "contents" | "content" => Ok(AdminResource::Contents),
            "posts" | "post" => Ok(AdminResource::Posts),
            _ => anyhow::bail!(
                "Unknown resource: {}. Expected users, hashtags, contents, or posts.",
                s
            ),
        }
    }
}

/// Paging parameters shared by every back-office listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub asc: bool,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort_by: "createdAt".to_string(),
            asc: true,
        }
    }
}

impl PageQuery {
    fn to_params(&self) -> [(&'static str, String); 4] {
        [
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("asc", self.asc.to_string()),
        ]
    }
}

#[derive(Serialize)]
struct StatusChange<'a> {
    status: &'a str,
}

#[derive(Serialize)]
struct Notice<'a> {
    title: &'a str,
    body: &'a str,
}

async fn require_admin(client: &AuthClient) -> Result<()> {
    match client.session().current().await {
        Some(session) if session.is_admin() => Ok(()),
        Some(_) => anyhow::bail!("This operation requires an administrator account"),
        None => anyhow::bail!("Not logged in. Run `bookshelf login` first."),
    }
}

/// Fetches one page of a back-office listing.
#[tracing::instrument(skip(client))]
pub async fn list(
    client: &AuthClient,
    resource: AdminResource,
    query: &PageQuery,
) -> Result<Listing<Value>> {
    require_admin(client).await?;

    let params = query.to_params();
    let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

    client
        .get_json_with_query(resource.page_path(), &params)
        .await
        .with_context(|| format!("Failed to list {}", resource))
}

/// Changes a user's account status (e.g. `ACTIVE`, `BLOCKED`).
#[tracing::instrument(skip(client))]
pub async fn set_user_status(client: &AuthClient, user_id: u64, status: &str) -> Result<()> {
    require_admin(client).await?;

    client
        .patch(
            &format!("/api/admin/user/{}/status", user_id),
            &StatusChange { status },
        )
        .await
        .with_context(|| format!("Failed to change status of user {}", user_id))?;
    Ok(())
}

/// Deletes one hashtag, content or post. Users are moderated through
/// [`set_user_status`] instead.
#[tracing::instrument(skip(client))]
pub async fn delete(client: &AuthClient, resource: AdminResource, id: u64) -> Result<()> {
    let path = resource
        .item_path(id)
        .with_context(|| format!("{} cannot be deleted; change their status instead", resource))?;
    require_admin(client).await?;

    client
        .delete(&path)
        .await
        .with_context(|| format!("Failed to delete {} {}", resource, id))?;
    Ok(())
}

/// Publishes a notice post.
#[tracing::instrument(skip(client, body))]
pub async fn post_notice(client: &AuthClient, title: &str, body: &str) -> Result<()> {
    require_admin(client).await?;

    let notice = serde_json::to_value(Notice { title, body })?;
    client
        .request(Method::POST, NOTICE_PATH, Some(&notice), &[])
        .await
        .context("Failed to publish notice")?;
    Ok(())
}
