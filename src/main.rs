use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use watchpost::app::AppContext;
use watchpost::cli::{commands, Cli, Commands};
use watchpost::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v picks debug
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Hashing needs neither config nor cache
    if let Commands::Hash { path } = &cli.command {
        commands::hash(path)?;
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config)?;
    let store = ctx.store.as_ref();

    match cli.command {
        Commands::Check { url, hash } => {
            commands::check(store, &url, &hash)?;
        }
        Commands::Stats => {
            commands::stats(store)?;
        }
        Commands::Clear => {
            commands::clear(store)?;
        }
        Commands::Remove { url } => {
            commands::remove(store, &url)?;
        }
        Commands::Hash { .. } => {}
        Commands::Resolve { channel } => {
            commands::resolve(&ctx, &channel).await?;
        }
        Commands::Feed { channel, limit } => {
            commands::feed(&ctx, &channel, limit).await?;
        }
        Commands::Scrape { url, limit } => {
            commands::scrape(&ctx, &url, limit).await?;
        }
        Commands::Run => {
            commands::run(&ctx).await?;
        }
    }

    Ok(())
}
