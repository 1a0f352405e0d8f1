// ============================================================================
// SafetyNet record store
// ============================================================================
//
// People, fire-station coverage and medical records held in memory, mirrored
// to a JSON backing file, and served to the alert views and the HTTP layer.

pub mod config;
pub mod core;
pub mod repository;
pub mod service;
pub mod storage;
pub mod web;

// Re-export main types for convenience
pub use config::{AppConfig, StoreConfig};
pub use core::{MedicalRecord, Person, Result, StationMapping, StoreError};
pub use repository::{
    Entity, EntityRepository, MedicalRecordRepository, PersonRepository, Repositories,
    StationMappingRepository,
};
pub use service::AlertService;
pub use storage::{CacheStore, PersistenceHealth, SeedSource};
pub use web::{AppState, build_router};

/// Opens the store described by `config` and wires the repositories over it.
///
/// # Examples
///
/// ```no_run
/// use safetynet::{StoreConfig, open};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repos = open(&StoreConfig::new("data/safetynet.json"))?;
/// if let Some(person) = repos.people.find_by_name("john", " boyd ")? {
///     println!("{} lives at {}", person.first_name, person.address);
/// }
/// # Ok(())
/// # }
/// ```
pub fn open(config: &StoreConfig) -> Result<Repositories> {
    let store = std::sync::Arc::new(CacheStore::open(config)?);
    Ok(Repositories::new(store))
}
