use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m3u_tuner::{
    catalog::CatalogClient,
    config::Config,
    errors::{TunerError, TunerResult},
    ingestor::PlaylistIngestor,
    models::ChannelQuery,
};

#[derive(Parser)]
#[command(name = "m3u-tuner")]
#[command(version)]
#[command(about = "IPTV tuner core: playlist ingestion and catalog browsing")]
struct Cli {
    /// Configuration file path (falls back to $CONFIG_FILE, then config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download, parse, and save a playlist into the catalog
    Ingest {
        /// Playlist URL (falls back to `ingestion.playlist_url` in config)
        #[arg(long)]
        url: Option<String>,
    },
    /// Trigger a server-side playlist refresh
    Refresh {
        #[arg(long)]
        url: Option<String>,
    },
    /// List channels from the catalog
    Channels {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        favorites: bool,
        #[arg(long, default_value_t = 0)]
        page: u64,
        #[arg(long, default_value_t = 100)]
        page_size: u64,
    },
    /// List channel groups with counts
    Groups,
    /// Toggle a channel's favorite flag
    Favorite { channel_number: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("m3u_tuner={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(cli.config.as_deref())?;

    run(cli.command, config).await?;
    Ok(())
}

async fn run(command: Command, config: Config) -> TunerResult<()> {
    let client = reqwest::Client::builder()
        .connect_timeout(config.ingestion.connect_timeout())
        .build()
        .map_err(|e| TunerError::configuration(format!("failed to build HTTP client: {e}")))?;
    let catalog = CatalogClient::new(client.clone(), &config.catalog.base_url);

    match command {
        Command::Ingest { url } => {
            let url = resolve_playlist_url(url, &config)?;
            let ingestor = PlaylistIngestor::new(client, catalog);
            let progress = progress_printer();
            let channels = ingestor.ingest(&url, Some(&progress)).await?;
            println!("Ingested {} channels", channels.len());
        }
        Command::Refresh { url } => {
            let url = resolve_playlist_url(url, &config)?;
            let progress = progress_printer();
            catalog.refresh_playlist(&url, Some(&progress)).await?;
            println!("Refresh completed");
        }
        Command::Channels {
            search,
            group,
            favorites,
            page,
            page_size,
        } => {
            let mut query = ChannelQuery::page(page, page_size).favorites_only(favorites);
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(group) = group {
                query = query.group(group);
            }
            let page = catalog.get_channels(&query).await?;
            for channel in &page.items {
                let star = if channel.is_favorite { "*" } else { " " };
                println!(
                    "{star} {:>4}  {:<30} {}",
                    channel.channel_number, channel.name, channel.group
                );
            }
            println!("{} of {} channels", page.items.len(), page.total);
        }
        Command::Groups => {
            for group in catalog.get_groups().await? {
                println!("{:<30} {}", group.name, group.count);
            }
        }
        Command::Favorite { channel_number } => {
            let channel = catalog.toggle_favorite(channel_number).await?;
            println!(
                "Channel {} '{}' favorite: {}",
                channel.channel_number, channel.name, channel.is_favorite
            );
        }
    }

    Ok(())
}

fn resolve_playlist_url(url: Option<String>, config: &Config) -> TunerResult<String> {
    let url = url
        .or_else(|| config.ingestion.playlist_url.clone())
        .ok_or_else(|| {
            TunerError::configuration("no playlist URL given and ingestion.playlist_url is unset")
        })?;
    url::Url::parse(&url)
        .map_err(|e| TunerError::configuration(format!("invalid playlist URL '{url}': {e}")))?;
    Ok(url)
}

/// Progress callback logging every 10% (or every MiB when the total is
/// unknown), mirroring byte counts from the chunked download.
fn progress_printer() -> impl Fn(u64, u64) + Send + Sync {
    let last_logged = AtomicU64::new(0);
    move |received, total| {
        if total > 0 {
            let percent = received * 100 / total;
            let last = last_logged.load(Ordering::Relaxed);
            if percent >= last + 10 || received == total {
                last_logged.store(percent, Ordering::Relaxed);
                info!("Downloaded {}% ({} / {} bytes)", percent, received, total);
            }
        } else {
            let mib = received / (1024 * 1024);
            if mib > last_logged.swap(mib, Ordering::Relaxed) {
                info!("Downloaded {} bytes (total unknown)", received);
            }
        }
    }
}
