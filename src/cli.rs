use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rangecast")]
#[command(author, version, about = "HTTP byte-range media streaming server and client")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the range server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Media file to serve (overrides config)
        #[arg(long)]
        media: Option<PathBuf>,
    },

    /// Fetch a media resource segment by segment and write it to a file
    Fetch {
        /// URL of the range server
        #[arg(required = true)]
        url: String,

        /// Output file for the reassembled stream
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// Bytes per range request (overrides config)
        #[arg(long)]
        chunk_size: Option<u64>,
    },

    /// Query a range server for the total resource length
    Probe {
        /// URL of the range server
        #[arg(required = true)]
        url: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
