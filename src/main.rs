use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use runnel::app::{AppContext, FeedReader};
use runnel::cli::{commands, Cli, Commands};
use runnel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(workers) = cli.workers {
        config.fetch.workers = workers;
    }

    let ctx = AppContext::new(cli.db, config)?;
    let reader = FeedReader::new(ctx);

    match cli.command {
        Commands::Add { url, name } => {
            commands::add_source(&reader, &url, name).await?;
        }
        Commands::Edit { id, name, url } => {
            commands::edit_source(&reader, &id, name, url.as_deref()).await?;
        }
        Commands::Remove { id } => {
            commands::remove_source(&reader, &id).await?;
        }
        Commands::Move { from, to } => {
            commands::move_source(&reader, from, to).await?;
        }
        Commands::Update => {
            commands::update(&reader).await?;
        }
        Commands::List {
            items,
            starred,
            source,
        } => {
            if items {
                commands::list_items(&reader, starred, source.as_deref()).await?;
            } else {
                commands::list_sources(&reader).await;
            }
        }
        Commands::Read { key } => {
            commands::mark_read(&reader, &key).await?;
        }
        Commands::ReadAll => commands::mark_all_read(&reader).await,
        Commands::Star { key } => {
            commands::toggle_star(&reader, &key).await?;
        }
        Commands::ClearCache => commands::clear_cache(&reader).await,
        Commands::ClearRead => commands::clear_read(&reader).await,
        Commands::ClearStarred => commands::clear_starred(&reader).await,
    }

    Ok(())
}
