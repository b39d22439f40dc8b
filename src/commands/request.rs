use anyhow::{Context, Result};
use log::debug;
use reqwest::Method;
use serde_json::Value;

use crate::{config::Config, runtime::Runtime};

/// Parses a `key=value` query parameter.
pub fn parse_query_param(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .with_context(|| format!("Invalid query parameter '{}', expected key=value", s))?;
    if key.is_empty() {
        anyhow::bail!("Invalid query parameter '{}', key is empty", s);
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", method))
}

/// Sends an arbitrary request through the authenticated client and prints the
/// response status and body.
#[tracing::instrument(skip(config, data))]
pub async fn request<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    method: &str,
    path: &str,
    data: Option<&str>,
    query: &[(String, String)],
) -> Result<()> {
    let method = parse_method(method)?;
    let body = data
        .map(|raw| serde_json::from_str::<Value>(raw).context("--data is not valid JSON"))
        .transpose()?;
    let params: Vec<(&str, &str)> = query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let client = config.connect()?;
    let response = client
        .request(method, path, body.as_ref(), &params)
        .await?;

    let status = response.status();
    let text = response
        .text()
        .await
        .context("Failed to read response body")?;
    debug!("{} returned {} ({} bytes)", path, status, text.len());

    println!("{}", status);
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
