use super::{Entity, EntityRepository};
use crate::core::key::{self, eq_normalized, is_blank};
use crate::core::{Person, Result};
use crate::storage::CacheStore;
use im::Vector;
use std::collections::HashSet;

impl Entity for Person {
    const KIND: &'static str = "person";
    const KEY_FIELDS: &'static str = "firstName and lastName";
    const KEY_ARITY: usize = 2;

    fn key_parts(&self) -> Vec<&str> {
        vec![self.first_name.as_str(), self.last_name.as_str()]
    }

    fn snapshot(store: &CacheStore) -> Result<Vector<Self>> {
        store.people()
    }

    fn update<F>(store: &CacheStore, f: F) -> Result<bool>
    where
        F: FnOnce(Vector<Self>) -> Option<Vector<Self>>,
    {
        store.update_people(f)
    }
}

pub type PersonRepository = EntityRepository<Person>;

impl EntityRepository<Person> {
    pub fn find_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<Person>> {
        self.find_by_key(&[first_name, last_name])
    }

    pub fn delete_by_name(&self, first_name: &str, last_name: &str) -> Result<bool> {
        self.delete_by_key(&[first_name, last_name])
    }

    /// Everyone living at any of `addresses`. An empty set returns nothing without a store read.
    pub fn find_by_addresses<I, S>(&self, addresses: I) -> Result<Vec<Person>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: HashSet<String> = addresses
            .into_iter()
            .filter(|address| !is_blank(address.as_ref()))
            .map(|address| key::normalize(address.as_ref()))
            .collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }
        self.find_where(|person| wanted.contains(&key::normalize(&person.address)))
    }

    pub fn find_by_address(&self, address: &str) -> Result<Vec<Person>> {
        if is_blank(address) {
            return Ok(Vec::new());
        }
        self.find_where(|person| eq_normalized(&person.address, address))
    }

    pub fn find_by_last_name(&self, last_name: &str) -> Result<Vec<Person>> {
        if is_blank(last_name) {
            return Ok(Vec::new());
        }
        self.find_where(|person| eq_normalized(&person.last_name, last_name))
    }

    pub fn find_by_city(&self, city: &str) -> Result<Vec<Person>> {
        if is_blank(city) {
            return Ok(Vec::new());
        }
        self.find_where(|person| eq_normalized(&person.city, city))
    }
}
