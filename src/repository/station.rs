use super::{Entity, EntityRepository};
use crate::core::key::{eq_normalized, is_blank};
use crate::core::{Result, StationMapping};
use crate::storage::CacheStore;
use im::Vector;

impl Entity for StationMapping {
    const KIND: &'static str = "firestation";
    const KEY_FIELDS: &'static str = "address";
    const KEY_ARITY: usize = 1;

    fn key_parts(&self) -> Vec<&str> {
        vec![self.address.as_str()]
    }

    fn snapshot(store: &CacheStore) -> Result<Vector<Self>> {
        store.station_mappings()
    }

    fn update<F>(store: &CacheStore, f: F) -> Result<bool>
    where
        F: FnOnce(Vector<Self>) -> Option<Vector<Self>>,
    {
        store.update_station_mappings(f)
    }
}

pub type StationMappingRepository = EntityRepository<StationMapping>;

impl EntityRepository<StationMapping> {
    pub fn find_by_address(&self, address: &str) -> Result<Option<StationMapping>> {
        self.find_by_key(&[address])
    }

    pub fn delete_by_address(&self, address: &str) -> Result<bool> {
        self.delete_by_key(&[address])
    }

    /// Addresses covered by `station`, in collection order.
    pub fn find_addresses_by_station(&self, station: &str) -> Result<Vec<String>> {
        if is_blank(station) {
            return Ok(Vec::new());
        }
        Ok(self
            .find_where(|mapping| eq_normalized(&mapping.station, station))?
            .into_iter()
            .map(|mapping| mapping.address)
            .collect())
    }

    pub fn find_station_by_address(&self, address: &str) -> Result<Option<String>> {
        Ok(self.find_by_address(address)?.map(|mapping| mapping.station))
    }
}
