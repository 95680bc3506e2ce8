use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use futures_util::future::join_all;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use imgflight::domain::errors::ConfigError;
use imgflight::infrastructure::{
    AppConfig, CliArgs, ImageCache, ImageCrateDecoder, IoScheduler, StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<(AppConfig, Option<ConfigError>)> {
    let storage = match &args.config {
        Some(path) => StorageManager::with_dir(
            path.parent().map(PathBuf::from).unwrap_or_default(),
        ),
        None => StorageManager::new()?,
    };
    let (mut config, rejected) = storage.load_or_default(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok((config, rejected))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let (config, rejected) = load_config(&args)?;
    init_logging(&config)?;

    if let Some(error) = rejected {
        warn!(error = %error, "Failed to parse config file, using defaults");
    }
    info!(version = imgflight::VERSION, config = ?config.config, "Starting imgflight");

    let io = IoScheduler::new();
    let cache = ImageCache::new(io, Arc::new(ImageCrateDecoder), config.cache.clone())?;

    cache.preload(&args.preload);

    let results = join_all(args.paths.iter().map(|path| cache.get_image(path))).await;
    for (path, result) in args.paths.iter().zip(results) {
        match result {
            Ok(Ok(image)) => println!("{}: {}x{}", path.display(), image.width(), image.height()),
            Ok(Err(error)) => println!("{}: {error}", path.display()),
            Err(error) => warn!(path = %path.display(), error = %error, "Load abandoned"),
        }
    }

    info!("{}", cache.stats());
    cache.dispose().await?;

    Ok(())
}
