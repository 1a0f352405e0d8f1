//! The persistent cache store.
//!
//! Holds the three collections as the single source of truth while the process
//! runs and mirrors every mutation to the backing file. Readers get persistent
//! `im::Vector` snapshots that share structure with the store but can never
//! reach back into it.

use super::persistence::{CollectionCounts, DataFile, Dataset, FileState};
use super::seed::SeedSource;
use crate::config::StoreConfig;
use crate::core::{MedicalRecord, Person, Result, StationMapping, StoreError};
use chrono::{DateTime, Utc};
use im::Vector;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    People,
    StationMappings,
    MedicalRecords,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::People => write!(f, "persons"),
            Collection::StationMappings => write!(f, "firestations"),
            Collection::MedicalRecords => write!(f, "medicalrecords"),
        }
    }
}

/// Durability signal for the backing file.
///
/// A failed write leaves memory ahead of disk until the next successful write;
/// `last_write_failed` is how that divergence becomes observable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceHealth {
    pub loaded_from_storage: bool,
    pub last_write_failed: bool,
    pub consecutive_failures: u64,
    pub total_failures: u64,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

impl PersistenceHealth {
    fn record_success(&mut self) {
        self.last_write_failed = false;
        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());
    }

    fn record_failure(&mut self, err: &StoreError) {
        self.last_write_failed = true;
        self.consecutive_failures += 1;
        self.total_failures += 1;
        self.last_error = Some(err.to_string());
    }

    pub fn is_consistent(&self) -> bool {
        !self.last_write_failed
    }
}

struct StoreState {
    data: Dataset,
    health: PersistenceHealth,
}

pub struct CacheStore {
    file: DataFile,
    state: RwLock<StoreState>,
}

impl CacheStore {
    /// Loads the store from its backing file, falling back to the seed.
    ///
    /// Fails only when neither the backing file nor the seed yields a dataset.
    /// Records sharing a normalized key collapse to the last occurrence. A seeded or
    /// collapsed dataset is written through to the backing file right away; if
    /// that write fails the store still opens and reports it in [`health`](Self::health).
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let file = DataFile::new(&config.data_path);
        let (data, health) = bootstrap(&file, &config.seed)?;

        let counts = data.counts();
        info!(
            path = %file.path().display(),
            loaded_from_storage = health.loaded_from_storage,
            persons = counts.people,
            firestations = counts.station_mappings,
            medicalrecords = counts.medical_records,
            "record store initialized"
        );

        Ok(Self {
            file,
            state: RwLock::new(StoreState { data, health }),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn people(&self) -> Result<Vector<Person>> {
        Ok(self.state.read()?.data.people.clone())
    }

    pub fn station_mappings(&self) -> Result<Vector<StationMapping>> {
        Ok(self.state.read()?.data.station_mappings.clone())
    }

    pub fn medical_records(&self) -> Result<Vector<MedicalRecord>> {
        Ok(self.state.read()?.data.medical_records.clone())
    }

    /// Replaces the whole people collection, then rewrites the backing file.
    pub fn set_people<I>(&self, people: I) -> Result<()>
    where
        I: IntoIterator<Item = Person>,
    {
        let people: Vector<Person> = people.into_iter().collect();
        self.replace(Collection::People, move |data| data.people = people)
    }

    pub fn set_station_mappings<I>(&self, mappings: I) -> Result<()>
    where
        I: IntoIterator<Item = StationMapping>,
    {
        let mappings: Vector<StationMapping> = mappings.into_iter().collect();
        self.replace(Collection::StationMappings, move |data| {
            data.station_mappings = mappings
        })
    }

    pub fn set_medical_records<I>(&self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = MedicalRecord>,
    {
        let records: Vector<MedicalRecord> = records.into_iter().collect();
        self.replace(Collection::MedicalRecords, move |data| {
            data.medical_records = records
        })
    }

    pub fn counts(&self) -> Result<CollectionCounts> {
        Ok(self.state.read()?.data.counts())
    }

    pub fn health(&self) -> Result<PersistenceHealth> {
        Ok(self.state.read()?.health.clone())
    }

    /// Rewrites the backing file from memory and, unlike the setters, reports failure.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.write()?;
        match self.file.save(&state.data) {
            Ok(()) => {
                state.health.record_success();
                debug!(path = %self.file.path().display(), "record store flushed");
                Ok(())
            }
            Err(err) => {
                state.health.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Runs a read-modify-write cycle on the people collection under the write lock.
    ///
    /// `f` receives a detached copy. Returning `None` leaves the store and the
    /// backing file untouched; returning `Some` swaps the collection in and
    /// persists it exactly like [`set_people`](Self::set_people).
    pub fn update_people<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(Vector<Person>) -> Option<Vector<Person>>,
    {
        self.update(Collection::People, |data| &mut data.people, f)
    }

    pub fn update_station_mappings<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(Vector<StationMapping>) -> Option<Vector<StationMapping>>,
    {
        self.update(
            Collection::StationMappings,
            |data| &mut data.station_mappings,
            f,
        )
    }

    pub fn update_medical_records<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(Vector<MedicalRecord>) -> Option<Vector<MedicalRecord>>,
    {
        self.update(
            Collection::MedicalRecords,
            |data| &mut data.medical_records,
            f,
        )
    }

    fn replace<F>(&self, collection: Collection, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Dataset),
    {
        let mut state = self.state.write()?;
        apply(&mut state.data);
        self.persist_locked(&mut state, collection);
        Ok(())
    }

    fn update<T, F>(
        &self,
        collection: Collection,
        slot: fn(&mut Dataset) -> &mut Vector<T>,
        f: F,
    ) -> Result<bool>
    where
        T: Clone,
        F: FnOnce(Vector<T>) -> Option<Vector<T>>,
    {
        let mut state = self.state.write()?;
        let current = slot(&mut state.data).clone();
        let Some(next) = f(current) else {
            return Ok(false);
        };
        *slot(&mut state.data) = next;
        self.persist_locked(&mut state, collection);
        Ok(true)
    }

    // Called with the write lock held, so nobody observes the new collection before
    // the disk write has been attempted. A failed write is not rolled back; memory
    // stays authoritative until a later write succeeds.
    fn persist_locked(&self, state: &mut StoreState, collection: Collection) {
        match self.file.save(&state.data) {
            Ok(()) => {
                state.health.record_success();
                debug!(
                    %collection,
                    path = %self.file.path().display(),
                    "collection persisted"
                );
            }
            Err(err) => {
                state.health.record_failure(&err);
                warn!(
                    %collection,
                    path = %self.file.path().display(),
                    consecutive_failures = state.health.consecutive_failures,
                    error = %err,
                    "failed to persist collection; in-memory state kept"
                );
            }
        }
    }
}

fn bootstrap(file: &DataFile, seed: &SeedSource) -> Result<(Dataset, PersistenceHealth)> {
    let (mut data, loaded_from_storage) = match file.load() {
        FileState::Loaded(data) => (data, true),
        FileState::Missing => {
            info!(path = %file.path().display(), %seed, "no backing file; loading seed");
            (load_seed(file, seed)?, false)
        }
        unusable => {
            warn!(
                path = %file.path().display(),
                state = %unusable,
                %seed,
                "backing file unusable; falling back to seed"
            );
            (load_seed(file, seed)?, false)
        }
    };

    let mut health = PersistenceHealth {
        loaded_from_storage,
        ..PersistenceHealth::default()
    };

    let dropped = data.collapse_duplicate_keys();
    if dropped > 0 {
        warn!(
            path = %file.path().display(),
            dropped,
            "duplicate natural keys on load; last occurrence kept"
        );
    } else if loaded_from_storage {
        return Ok((data, health));
    }

    match file.save(&data) {
        Ok(()) => health.record_success(),
        Err(err) => {
            warn!(
                path = %file.path().display(),
                error = %err,
                "failed to write initial dataset; serving from memory"
            );
            health.record_failure(&err);
        }
    }
    Ok((data, health))
}

fn load_seed(file: &DataFile, seed: &SeedSource) -> Result<Dataset> {
    seed.load().map_err(|err| {
        StoreError::Persistence(format!(
            "cannot initialize store: backing file '{}' unusable and seed {} failed: {}",
            file.path().display(),
            seed,
            err
        ))
    })
}
