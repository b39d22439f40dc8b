use anyhow::Result;

use crate::{api::user, config::Config, runtime::Runtime};

#[tracing::instrument(skip(config))]
pub async fn hashtags<R: Runtime + Clone + 'static>(config: &Config<R>) -> Result<()> {
    let client = config.connect()?;
    if !client.session().is_logged_in().await {
        anyhow::bail!("Not logged in. Run `bookshelf login` first.");
    }

    let tags = user::hashtags(&client).await?;
    if tags.is_empty() {
        println!("No preferred hashtags yet. Pick some with `bookshelf hashtags set`.");
        return Ok(());
    }
    for tag in tags {
        match tag.as_str() {
            Some(name) => println!("{}", name),
            None => println!("{}", serde_json::to_string(&tag)?),
        }
    }
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn set_hashtags<R: Runtime + Clone + 'static>(
    config: &Config<R>,
    tags: &[String],
) -> Result<()> {
    let client = config.connect()?;
    if !client.session().is_logged_in().await {
        anyhow::bail!("Not logged in. Run `bookshelf login` first.");
    }

    user::set_hashtags(&client, tags).await?;
    println!("Saved {} preferred hashtag(s).", tags.len());
    Ok(())
}
