mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use rangecast::client::{FileSink, RangeClient, SessionDriver};
use rangecast::{config, server};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "rangecast=trace,tower_http=debug".to_string()
        } else {
            "rangecast=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port, media } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(host, port, media, cli.config.as_deref()))
        }
        Commands::Fetch {
            url,
            output,
            chunk_size,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch(&url, &output, chunk_size, cli.config.as_deref()))
        }
        Commands::Probe { url } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe(&url, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("rangecast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn serve(
    host: String,
    port: u16,
    media: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override from CLI if specified
    config.server.host = host;
    config.server.port = port;
    if let Some(media) = media {
        config.server.media_path = media;
    }

    tracing::info!("Starting rangecast server");
    server::start_server(config).await
}

async fn fetch(
    url: &str,
    output: &Path,
    chunk_size: Option<u64>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override from CLI if specified, then re-validate the merged config so
    // a flag cannot smuggle in a value the config file could not.
    if let Some(chunk_size) = chunk_size {
        config.client.chunk_size = chunk_size;
    }
    config::validate_config(&config)?;

    let chunk_size = config.client.chunk_size;
    let timeout = Duration::from_secs(config.client.request_timeout_secs);

    let client = RangeClient::new(url, timeout)?;
    let sink = FileSink::create(output)?;

    // No player on the CLI, so close the event channel up front; the driver
    // self-paces against the always-idle file sink.
    let (events_tx, events_rx) = tokio::sync::mpsc::channel(1);
    drop(events_tx);

    let driver = SessionDriver::new(client, sink, chunk_size, events_rx);
    let sink = driver.run().await?;
    let written = sink.finish()?;

    println!("Wrote {} bytes to {:?}", written, output);
    Ok(())
}

async fn probe(url: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let timeout = Duration::from_secs(config.client.request_timeout_secs);

    let client = RangeClient::new(url, timeout)?;
    let total = client.probe().await?;

    println!("{}", total);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Media: {:?}", config.server.media_path);
            println!("  Content type: {}", config.server.content_type);
            println!("  Chunk size: {} bytes", config.client.chunk_size);
            println!(
                "  Request timeout: {}s",
                config.client.request_timeout_secs
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Media: {:?}", config.server.media_path);
        }
    }

    Ok(())
}
