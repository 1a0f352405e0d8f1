//! Backing-file persistence for the record store.
//!
//! The whole store is one indented JSON document with three named arrays.
//! Every write goes to a sibling `.tmp` file, is synced, then renamed over the
//! backing file, so a reader never sees a half-written document.

use crate::core::key;
use crate::core::{MedicalRecord, Person, Result, StationMapping, StoreError};
use im::Vector;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Dataset
// ============================================================================

/// The three collections, as held in memory and as laid out on disk.
///
/// A collection missing from the document, or given as `null`, loads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "persons", default, deserialize_with = "null_as_empty")]
    pub people: Vector<Person>,
    #[serde(rename = "firestations", default, deserialize_with = "null_as_empty")]
    pub station_mappings: Vector<StationMapping>,
    #[serde(rename = "medicalrecords", default, deserialize_with = "null_as_empty")]
    pub medical_records: Vector<MedicalRecord>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vector<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Clone + Deserialize<'de>,
{
    Ok(Option::<Vector<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Dataset {
    pub fn new(
        people: impl IntoIterator<Item = Person>,
        station_mappings: impl IntoIterator<Item = StationMapping>,
        medical_records: impl IntoIterator<Item = MedicalRecord>,
    ) -> Self {
        Self {
            people: people.into_iter().collect(),
            station_mappings: station_mappings.into_iter().collect(),
            medical_records: medical_records.into_iter().collect(),
        }
    }

    pub fn counts(&self) -> CollectionCounts {
        CollectionCounts {
            people: self.people.len(),
            station_mappings: self.station_mappings.len(),
            medical_records: self.medical_records.len(),
        }
    }

    /// Parses a document. Blank input is rejected; callers decide whether that is fatal.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(StoreError::Serialization("document is empty".to_string()));
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Drops records whose normalized natural key repeats, keeping the last
    /// occurrence of each. Records with a blank key component are left alone.
    /// Returns how many records were dropped.
    pub fn collapse_duplicate_keys(&mut self) -> usize {
        keep_last(&mut self.people, |p| vec![&p.first_name, &p.last_name])
            + keep_last(&mut self.station_mappings, |m| vec![&m.address])
            + keep_last(&mut self.medical_records, |r| vec![&r.first_name, &r.last_name])
    }
}

fn keep_last<T, F>(items: &mut Vector<T>, key_of: F) -> usize
where
    T: Clone,
    F: Fn(&T) -> Vec<&String>,
{
    let mut seen = HashSet::new();
    let mut kept: Vec<T> = items
        .iter()
        .rev()
        .filter(|item| {
            let parts = key_of(*item);
            if parts.iter().any(|part| key::is_blank(part.as_str())) {
                return true;
            }
            seen.insert(
                parts
                    .iter()
                    .map(|part| key::normalize(part.as_str()))
                    .collect::<Vec<_>>(),
            )
        })
        .cloned()
        .collect();

    let dropped = items.len() - kept.len();
    if dropped > 0 {
        kept.reverse();
        *items = kept.into_iter().collect();
    }
    dropped
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub people: usize,
    pub station_mappings: usize,
    pub medical_records: usize,
}

// ============================================================================
// Data File
// ============================================================================

/// What was found at the backing path on startup.
#[derive(Debug)]
pub enum FileState {
    Missing,
    Empty,
    Unreadable(String),
    Corrupt(String),
    Loaded(Dataset),
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Missing => write!(f, "missing"),
            FileState::Empty => write!(f, "empty"),
            FileState::Unreadable(err) => write!(f, "unreadable: {}", err),
            FileState::Corrupt(err) => write!(f, "unparsable: {}", err),
            FileState::Loaded(_) => write!(f, "loaded"),
        }
    }
}

pub struct DataFile {
    path: PathBuf,
}

impl DataFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> FileState {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return FileState::Missing,
            Err(err) => return FileState::Unreadable(err.to_string()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return FileState::Empty;
        }
        match Dataset::decode(&bytes) {
            Ok(dataset) => FileState::Loaded(dataset),
            Err(err) => FileState::Corrupt(err.to_string()),
        }
    }

    /// Serializes `dataset` and atomically replaces the backing file, creating
    /// missing parent directories first.
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        let bytes = dataset.encode()?;
        self.write_atomic(&bytes)
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Persistence(format!(
                        "Failed to create data directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let tmp = self.temp_path();
        let mut file = File::create(&tmp).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to create temp file '{}': {}",
                tmp.display(),
                e
            ))
        })?;

        // The rename replaces the inode, so carry the current mode across.
        if let Ok(metadata) = fs::metadata(&self.path) {
            file.set_permissions(metadata.permissions()).map_err(|e| {
                StoreError::Persistence(format!(
                    "Failed to copy permissions onto '{}': {}",
                    tmp.display(),
                    e
                ))
            })?;
        }

        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| {
                StoreError::Persistence(format!(
                    "Failed to write temp file '{}': {}",
                    tmp.display(),
                    e
                ))
            })?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to rename temp file '{}' -> '{}': {}",
                tmp.display(),
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }

    /// `<file name>.tmp` next to the backing file.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
