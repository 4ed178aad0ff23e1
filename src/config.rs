use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_EXTRACTION_API_URL: &str =
    "https://api.yabes-desu.workers.dev/download/instagram/v2";
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
pub const DEFAULT_UPLOAD_FOLDER: &str = "instagram_imports";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_base: String,
    pub upload_folder: String,
    pub timeout: Duration,
}

/// Complete set of Cloudinary credentials, only obtainable when all three are present.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl StorageConfig {
    pub fn credentials(&self) -> Option<CloudinaryCredentials> {
        Some(CloudinaryCredentials {
            cloud_name: self.cloud_name.clone()?,
            api_key: self.api_key.clone()?,
            api_secret: self.api_secret.clone()?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }
}

// The secret never reaches the logs.
impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "***"))
            .field("api_base", &self.api_base)
            .field("upload_folder", &self.upload_folder)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        // Empty values count as unset
        let secret = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let seconds = |key: &str, default: u64| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}")),
                None => Ok(Duration::from_secs(default)),
            }
        };

        Ok(Self {
            server: ServerConfig {
                port: var_or("PORT", "8000")
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: var_or("HOST", "0.0.0.0"),
            },
            extraction: ExtractionConfig {
                base_url: var_or("EXTRACTION_API_URL", DEFAULT_EXTRACTION_API_URL),
                timeout: seconds("EXTRACTION_TIMEOUT_SECS", 30)?,
            },
            storage: StorageConfig {
                cloud_name: secret("CLOUDINARY_CLOUD_NAME"),
                api_key: secret("CLOUDINARY_API_KEY"),
                api_secret: secret("CLOUDINARY_API_SECRET"),
                api_base: var_or("CLOUDINARY_API_BASE", DEFAULT_CLOUDINARY_API_BASE),
                upload_folder: var_or("CLOUDINARY_UPLOAD_FOLDER", DEFAULT_UPLOAD_FOLDER),
                timeout: seconds("UPLOAD_TIMEOUT_SECS", 60)?,
            },
        })
    }
}
