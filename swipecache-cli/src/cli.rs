use clap::{Parser, Subcommand};
use std::path::PathBuf;
use swipecache_engine::KeyStrategy;
use url::Url;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    name = "swipecache",
    version,
    about = "Inspect, warm and clear the on-device video cache",
    long_about = "Resolves video URLs through the local cache, downloading and storing\n\
                  whatever is missing one request at a time. Also exposes the cache\n\
                  maintenance actions a settings screen would offer."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Parent directory of the cache (defaults to the system temp directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// How URLs map to cache file names
    #[arg(long, global = true, value_enum, default_value = "last-segment")]
    pub key_strategy: KeyStrategy,

    /// Overall request timeout in seconds (0 disables it)
    #[arg(long, global = true, default_value = "600")]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    pub connect_timeout: u64,

    /// User agent sent with downloads
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Custom HTTP headers for download requests
    #[arg(
        long = "header",
        short = 'H',
        global = true,
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve URLs to local files, downloading any that are not cached
    Resolve {
        /// Video URLs, serviced in the order given
        #[arg(required = true)]
        urls: Vec<Url>,
    },

    /// Show where a player would read the video from, warming the cache on a miss
    Source {
        /// Video URL
        url: Url,
    },

    /// Print the cached path for a URL, if any
    Lookup {
        /// Video URL
        url: Url,
    },

    /// Store a local file in the cache under a URL
    Import {
        /// Video URL the file belongs to
        url: Url,

        /// File to copy into the cache
        file: PathBuf,
    },

    /// Remove the cached entry for a URL
    Remove {
        /// Video URL
        url: Url,
    },

    /// Remove every cached video
    Clear,
}
