use std::path::PathBuf;

use carnyx_core::prelude::*;
use clap::Parser;

pub const USAGE: &str = "usage: carnyx <collection-id> <directory>\n       carnyx <item-id> [album]";

#[derive(Parser, Debug)]
#[command(name = "carnyx")]
#[command(about = "Mirror a remote collection into a directory of tagged audio files", long_about = None)]
pub struct Args {
    /// Item id (11 characters) or collection id (34 characters)
    pub id: String,

    /// Collection: mirror directory and album tag. Item: album tag only
    pub destination: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "CARNYX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Concurrent acquisitions
    #[arg(short, long, env = "CARNYX_WORKERS")]
    pub workers: Option<usize>,

    /// Per-item timeout in seconds
    #[arg(long, env = "CARNYX_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Target bitrate in kbps
    #[arg(long, env = "CARNYX_BITRATE")]
    pub bitrate: Option<u32>,

    /// Path of the yt-dlp executable
    #[arg(long = "yt-dlp", env = "CARNYX_YT_DLP")]
    pub yt_dlp: Option<PathBuf>,

    /// Keep partial output of failed downloads
    #[arg(long)]
    pub keep_partial: bool,

    /// Print the plan without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// File values first, then flags on top.
    pub fn sync_config(&self) -> Result<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::from_toml_path(path)?,
            None => SyncConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.item_timeout_secs = timeout;
        }
        if let Some(bitrate) = self.bitrate {
            config.bitrate_kbps = bitrate;
        }
        if let Some(yt_dlp) = &self.yt_dlp {
            config.yt_dlp = yt_dlp.clone();
        }
        if self.keep_partial {
            config.cleanup_partial = false;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn invocation(&self) -> Result<Invocation> {
        Invocation::from_args(&self.id, self.destination.as_deref())
    }
}
