use uuid::Uuid;

use crate::app::{FeedReader, RefreshOutcome, Result, RunnelError};
use crate::domain::{FeedFilter, Item};

fn parse_source_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| RunnelError::SourceNotFound(raw.to_string()))
}

async fn find_item(reader: &FeedReader, key: &str) -> Result<Item> {
    reader
        .find_item(key)
        .await
        .ok_or_else(|| RunnelError::ItemNotFound(key.to_string()))
}

pub async fn add_source(reader: &FeedReader, url: &str, name: Option<String>) -> Result<()> {
    let source = reader.validate_and_add_source(url, name).await?;
    println!("Added source: {} ({})", source.display_name(), source.id);
    print_error_message(reader).await;
    Ok(())
}

pub async fn edit_source(
    reader: &FeedReader,
    id: &str,
    name: Option<String>,
    url: Option<&str>,
) -> Result<()> {
    let id = parse_source_id(id)?;
    let name = match name {
        Some(name) => name,
        None => reader
            .sources()
            .await
            .into_iter()
            .find(|s| s.id == id)
            .and_then(|s| s.name)
            .unwrap_or_default(),
    };

    let source = reader.update_source(id, name, url).await?;
    println!("Updated source: {}\n  {}", source.display_name(), source.url);
    Ok(())
}

pub async fn remove_source(reader: &FeedReader, id: &str) -> Result<()> {
    reader.delete_source(parse_source_id(id)?).await?;
    println!("Removed source: {}", id);
    Ok(())
}

pub async fn move_source(reader: &FeedReader, from: usize, to: usize) -> Result<()> {
    reader.move_source(from, to).await?;
    list_sources(reader).await;
    Ok(())
}

pub async fn update(reader: &FeedReader) -> Result<()> {
    match reader.load_all_feeds().await? {
        RefreshOutcome::Completed { fetched, failed } => {
            println!(
                "Update complete: {} items fetched, {} sources failed",
                fetched, failed
            );
        }
        RefreshOutcome::NoSources => println!("No sources to update"),
        RefreshOutcome::Coalesced => println!("An update is already running"),
    }
    print_error_message(reader).await;
    Ok(())
}

pub async fn list_sources(reader: &FeedReader) {
    let sources = reader.sources().await;

    if sources.is_empty() {
        println!("No sources");
        return;
    }

    for (position, source) in sources.iter().enumerate() {
        println!(
            "{:>2}. {} [{}]\n    {}",
            position,
            source.display_name(),
            source.id,
            source.url
        );
    }
}

pub async fn list_items(reader: &FeedReader, starred: bool, source: Option<&str>) -> Result<()> {
    let filter = match (starred, source) {
        (true, _) => FeedFilter::Starred,
        (false, Some(id)) => FeedFilter::Source(parse_source_id(id)?),
        (false, None) => FeedFilter::All,
    };
    reader.set_filter(filter).await;

    let items = reader.items().await;
    if items.is_empty() {
        println!("No items");
        return Ok(());
    }

    for item in items {
        let read_marker = if reader.is_read(&item).await { " " } else { "●" };
        let star_marker = if reader.is_starred(&item).await { "★" } else { " " };
        println!(
            "{}{} {} {}\n    {}",
            read_marker,
            star_marker,
            item.published_at.format("%Y-%m-%d"),
            item.display_title(),
            item.stable_key()
        );
    }

    Ok(())
}

pub async fn mark_read(reader: &FeedReader, key: &str) -> Result<()> {
    let item = find_item(reader, key).await?;
    reader.mark_as_read(&item).await;
    println!("Marked read: {}", item.display_title());
    Ok(())
}

pub async fn mark_all_read(reader: &FeedReader) {
    reader.mark_all_as_read().await;
    println!("Marked all items read");
}

pub async fn toggle_star(reader: &FeedReader, key: &str) -> Result<()> {
    let item = find_item(reader, key).await?;
    if reader.toggle_star(&item).await {
        println!("Starred: {}", item.display_title());
    } else {
        println!("Unstarred: {}", item.display_title());
    }
    Ok(())
}

pub async fn clear_cache(reader: &FeedReader) {
    let kept = reader.clear_cache().await;
    println!("Cache cleared; {} starred items kept", kept);
}

pub async fn clear_read(reader: &FeedReader) {
    reader.clear_read_status().await;
    println!("Read marks cleared");
}

pub async fn clear_starred(reader: &FeedReader) {
    reader.clear_starred_status().await;
    println!("Stars cleared");
}

async fn print_error_message(reader: &FeedReader) {
    if let Some(message) = reader.error_message().await {
        eprintln!("  {}", message);
    }
}
