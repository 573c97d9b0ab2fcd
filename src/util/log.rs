use std::{fs::File, path::PathBuf, sync::Mutex};

use color_eyre::Result;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::data::storage;

pub const LOG_ENV: &str = "BEATSTORE_LOG";
const LOG_FILE: &str = "beatstore.log";
const DEFAULT_FILTER: &str = "beatstore=info,warn";

pub fn log_dir() -> Result<PathBuf> {
    match std::env::var("BEATSTORE_DATA_DIR") {
        Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir.trim())),
        _ => Ok(storage::default_data_dir()?),
    }
}

/// The terminal belongs to the UI, so everything goes to a file in the data directory.
pub fn initialize_logging() -> Result<()> {
    let directory = log_dir()?;
    std::fs::create_dir_all(&directory)?;
    let log_file = File::create(directory.join(LOG_FILE))?;

    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(ErrorLayer::default())
        .try_init()?;

    tracing::info!(dir = %directory.display(), "logging_initialized");
    Ok(())
}
