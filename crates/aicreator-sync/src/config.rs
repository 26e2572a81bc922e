use std::path::PathBuf;

use anyhow::Context;

use aicreator_remote::RemoteConfig;

use crate::tasks::DEFAULT_WORKERS;

pub const DEFAULT_DB_PATH: &str = "aicreator.db";
pub const DEFAULT_API_URL: &str = "https://api.yourservice.com";
pub const DEFAULT_MODEL_API_URL: &str = "https://api.replicate.com/v1/video/generate";
pub const DEFAULT_MEDIA_DIR: &str = "./media";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_url: String,
    pub model_api_url: String,
    pub media_dir: PathBuf,
    pub workers: usize,
    /// Bearer token for the model endpoint, recorded with the session.
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.into(),
            api_url: DEFAULT_API_URL.into(),
            model_api_url: DEFAULT_MODEL_API_URL.into(),
            media_dir: DEFAULT_MEDIA_DIR.into(),
            workers: DEFAULT_WORKERS,
            api_token: None,
        }
    }
}

impl Config {
    /// Read `AICREATOR_*` variables, loading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let workers = match get("AICREATOR_WORKERS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("AICREATOR_WORKERS is not a number: {:?}", raw))?,
            None => defaults.workers,
        };

        Ok(Self {
            db_path: get("AICREATOR_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            api_url: get("AICREATOR_API_URL").unwrap_or(defaults.api_url),
            model_api_url: get("AICREATOR_MODEL_API_URL").unwrap_or(defaults.model_api_url),
            media_dir: get("AICREATOR_MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_dir),
            workers,
            api_token: get("AICREATOR_API_TOKEN").filter(|t| !t.is_empty()),
        })
    }

    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig {
            api_url: self.api_url.clone(),
            model_api_url: self.model_api_url.clone(),
        }
    }
}
