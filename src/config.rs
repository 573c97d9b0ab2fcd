use std::path::PathBuf;

use tracing::debug;

use crate::{audio::config::AudioConfig, data::storage};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const KEYRING_SERVICE: &str = "beatstore";
const KEYRING_USER: &str = "api-token";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub data_dir: PathBuf,
    pub audio: AudioConfig,
}

impl AppConfig {
    /// Reads `BEATSTORE_*` variables. Call after `dotenv` so a `.env` file
    /// is honoured. The token falls back to the OS keyring.
    pub fn from_env() -> color_eyre::Result<Self> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        if config.api_token.is_none() {
            config.api_token = keyring_token();
        }
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> color_eyre::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = match var("BEATSTORE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => storage::default_data_dir()?,
        };

        let mut audio = AudioConfig::default();
        if let Some(volume) = var("BEATSTORE_VOLUME").and_then(|v| v.parse::<f32>().ok()) {
            audio.volume = volume.clamp(0.0, 1.0);
        }

        Ok(Self {
            api_url: var("BEATSTORE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: var("BEATSTORE_API_TOKEN"),
            data_dir,
            audio,
        })
    }
}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn keyring_token() -> Option<String> {
    match keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).and_then(|e| e.get_password()) {
        Ok(token) => Some(token),
        Err(e) => {
            debug!(error = %e, "config_keyring_token_unavailable");
            None
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn keyring_token() -> Option<String> {
    debug!(service = KEYRING_SERVICE, user = KEYRING_USER, "config_keyring_unsupported");
    None
}
