use super::persistence::Dataset;
use crate::core::{Result, StoreError};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Dataset compiled into the binary.
pub const EMBEDDED_SEED: &str = include_str!("../../data/seed.json");

/// Read-only initial dataset, consulted only when the backing file is unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SeedSource {
    /// The dataset bundled with the crate.
    #[default]
    Embedded,
    /// A JSON document on disk with the backing-file schema.
    File(PathBuf),
    /// A JSON document held in memory.
    Inline(String),
    /// No seed. Startup fails unless the backing file loads.
    Disabled,
}

impl SeedSource {
    pub fn load(&self) -> Result<Dataset> {
        match self {
            SeedSource::Embedded => decode_seed(EMBEDDED_SEED.as_bytes(), "embedded seed"),
            SeedSource::File(path) => {
                let bytes = fs::read(path).map_err(|e| {
                    StoreError::Persistence(format!(
                        "Failed to read seed file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                decode_seed(&bytes, &path.display().to_string())
            }
            SeedSource::Inline(json) => decode_seed(json.as_bytes(), "inline seed"),
            SeedSource::Disabled => Err(StoreError::Persistence(
                "no seed source is configured".to_string(),
            )),
        }
    }
}

fn decode_seed(bytes: &[u8], origin: &str) -> Result<Dataset> {
    Dataset::decode(bytes).map_err(|e| {
        StoreError::Persistence(format!("Failed to parse seed '{}': {}", origin, e))
    })
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::Embedded => write!(f, "embedded"),
            SeedSource::File(path) => write!(f, "file:{}", path.display()),
            SeedSource::Inline(_) => write!(f, "inline"),
            SeedSource::Disabled => write!(f, "disabled"),
        }
    }
}
