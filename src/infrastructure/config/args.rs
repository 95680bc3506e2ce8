use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "imgflight",
    version,
    about = "Load images through a serialized, priority-ordered disk pipeline",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Number of cached images that triggers a purge.
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Number of cached images kept by a purge.
    #[arg(long)]
    pub purge_size: Option<usize>,

    /// Treat paths differing only in case as different images.
    #[arg(long)]
    pub case_sensitive: Option<bool>,

    /// Paths to warm up in the background before loading.
    #[arg(long, value_name = "PATH")]
    pub preload: Vec<PathBuf>,

    /// Images to load.
    #[arg(value_name = "IMAGE")]
    pub paths: Vec<PathBuf>,
}
