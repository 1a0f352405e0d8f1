//! Keyed repositories over the cache store.
//!
//! Every mutation is one whole-collection read/modify/write cycle: take a copy,
//! compute the new list, hand it back to the store which persists it. The only
//! identity rule is the normalized natural key.

pub mod medical;
pub mod person;
pub mod station;

use crate::core::key;
use crate::core::{Result, StoreError};
use crate::storage::CacheStore;
use im::Vector;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub use medical::MedicalRecordRepository;
pub use person::PersonRepository;
pub use station::StationMappingRepository;

/// A record kind held by the [`CacheStore`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Name used in logs and error messages.
    const KIND: &'static str;

    /// Human-readable list of the key fields.
    const KEY_FIELDS: &'static str;

    /// Number of components in the natural key.
    const KEY_ARITY: usize;

    fn key_parts(&self) -> Vec<&str>;

    fn snapshot(store: &CacheStore) -> Result<Vector<Self>>;

    fn update<F>(store: &CacheStore, f: F) -> Result<bool>
    where
        F: FnOnce(Vector<Self>) -> Option<Vector<Self>>;

    fn matches_key(&self, query: &[&str]) -> bool {
        key::keys_match(&self.key_parts(), query)
    }
}

pub struct EntityRepository<E: Entity> {
    store: Arc<CacheStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for EntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityRepository<E> {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Looks a record up by natural key. Blank components never touch the store.
    pub fn find_by_key(&self, key: &[&str]) -> Result<Option<E>> {
        if !key::is_usable_key(key, E::KEY_ARITY) {
            return Ok(None);
        }
        let items = E::snapshot(&self.store)?;
        Ok(items.into_iter().find(|item| item.matches_key(key)))
    }

    pub fn exists_by_key(&self, key: &[&str]) -> Result<bool> {
        if !key::is_usable_key(key, E::KEY_ARITY) {
            return Ok(false);
        }
        let items = E::snapshot(&self.store)?;
        Ok(items.iter().any(|item| item.matches_key(key)))
    }

    pub fn find_all(&self) -> Result<Vec<E>> {
        Ok(E::snapshot(&self.store)?.into_iter().collect())
    }

    /// Upsert: drops every record sharing the entity's normalized key, then appends it.
    ///
    /// Fails with [`StoreError::InvalidArgument`] before touching the store when a
    /// key component is blank.
    pub fn save(&self, entity: E) -> Result<E> {
        let key = entity.key_parts();
        if !key::is_usable_key(&key, E::KEY_ARITY) {
            return Err(StoreError::invalid_argument(format!(
                "{} requires non-blank {}",
                E::KIND,
                E::KEY_FIELDS
            )));
        }

        let stored = entity.clone();
        E::update(&self.store, |mut items| {
            let key = stored.key_parts();
            items.retain(|item| !item.matches_key(&key));
            items.push_back(entity);
            Some(items)
        })?;

        debug!(kind = E::KIND, key = ?stored.key_parts(), "record saved");
        Ok(stored)
    }

    /// Removes the record with this key. Nothing is written when no record matches.
    pub fn delete_by_key(&self, key: &[&str]) -> Result<bool> {
        if !key::is_usable_key(key, E::KEY_ARITY) {
            return Ok(false);
        }

        let deleted = E::update(&self.store, |items| {
            let before = items.len();
            let kept: Vector<E> = items
                .into_iter()
                .filter(|item| !item.matches_key(key))
                .collect();
            (kept.len() < before).then_some(kept)
        })?;

        if deleted {
            debug!(kind = E::KIND, ?key, "record deleted");
        }
        Ok(deleted)
    }

    /// Linear scan with an arbitrary predicate.
    pub fn find_where<P>(&self, predicate: P) -> Result<Vec<E>>
    where
        P: Fn(&E) -> bool,
    {
        let items = E::snapshot(&self.store)?;
        Ok(items.into_iter().filter(|item| predicate(item)).collect())
    }
}

/// The three repositories over one store.
#[derive(Clone)]
pub struct Repositories {
    pub people: PersonRepository,
    pub stations: StationMappingRepository,
    pub medical_records: MedicalRecordRepository,
}

impl Repositories {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            people: PersonRepository::new(Arc::clone(&store)),
            stations: StationMappingRepository::new(Arc::clone(&store)),
            medical_records: MedicalRecordRepository::new(store),
        }
    }
}
