use crate::storage::SeedSource;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_PATH: &str = "data/safetynet.json";

/// Where the record store keeps its data and where it seeds from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backing file, rewritten on every mutation.
    pub data_path: PathBuf,

    /// Consulted only when the backing file is missing, empty or unparsable.
    pub seed: SeedSource,
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(data_path: P) -> Self {
        Self {
            data_path: data_path.as_ref().to_path_buf(),
            seed: SeedSource::Embedded,
        }
    }

    /// Set the seed source
    pub fn seed(mut self, seed: SeedSource) -> Self {
        self.seed = seed;
        self
    }

    /// Seed from a JSON file instead of the embedded dataset
    pub fn seed_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.seed = SeedSource::File(path.as_ref().to_path_buf());
        self
    }

    /// Refuse to start unless the backing file loads
    pub fn without_seed(mut self) -> Self {
        self.seed = SeedSource::Disabled;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATH)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("APP_PORT must be a valid u16")?;

        let data_path =
            env::var("SAFETYNET_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());

        let mut store = StoreConfig::new(data_path);
        if let Ok(seed_path) = env::var("SAFETYNET_SEED_PATH") {
            if !seed_path.trim().is_empty() {
                store = store.seed_file(seed_path);
            }
        }

        Ok(Self { host, port, store })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
