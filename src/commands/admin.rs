use anyhow::Result;
use log::debug;
use serde_json::Value;
use std::io::{self, Write};

use crate::{
    api::{AdminResource, Listing, PageQuery, admin},
    config::Config,
    runtime::Runtime,
};

#[tracing::instrument(skip(config))]
pub async fn admin_list<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    resource: AdminResource,
    query: PageQuery,
) -> Result<()> {
    let client = config.connect()?;
    let listing = admin::list(&client, resource, &query).await?;
    print_listing_with_io(resource, &query, &listing, &mut io::stdout())
}

/// Writes one JSON object per line, followed by the page position when known.
fn print_listing_with_io<W: Write>(
    resource: AdminResource,
    query: &PageQuery,
    listing: &Listing<Value>,
    out: &mut W,
) -> Result<()> {
    let items = listing.items();
    if items.is_empty() {
        writeln!(out, "No {} found.", resource)?;
        return Ok(());
    }

    for item in items {
        writeln!(out, "{}", serde_json::to_string(item)?)?;
    }
    if let Some(total) = listing.total_pages() {
        writeln!(out, "Page {} of {}", query.page + 1, total)?;
    }
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn admin_set_status<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    user_id: u64,
    status: &str,
) -> Result<()> {
    let client = config.connect()?;
    admin::set_user_status(&client, user_id, status).await?;
    println!("User {} is now {}.", user_id, status);
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn admin_delete<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    resource: AdminResource,
    id: u64,
    yes: bool,
) -> Result<()> {
    if resource.item_path(id).is_none() {
        anyhow::bail!("{} cannot be deleted; change their status instead", resource);
    }
    let client = config.connect()?;

    if !yes
        && !config
            .runtime
            .confirm(&format!("Delete {} {}?", resource, id))?
    {
        debug!("Deletion of {} {} cancelled by user", resource, id);
        println!("Cancelled.");
        return Ok(());
    }

    admin::delete(&client, resource, id).await?;
    println!("Deleted {} {}.", resource, id);
    Ok(())
}

#[tracing::instrument(skip(config, body))]
pub async fn admin_notice<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    title: &str,
    body: &str,
) -> Result<()> {
    let client = config.connect()?;
    admin::post_notice(&client, title, body).await?;
    println!("Notice published.");
    Ok(())
}
