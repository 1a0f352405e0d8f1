use super::{Entity, EntityRepository};
use crate::core::{MedicalRecord, Result};
use crate::storage::CacheStore;
use im::Vector;

impl Entity for MedicalRecord {
    const KIND: &'static str = "medicalRecord";
    const KEY_FIELDS: &'static str = "firstName and lastName";
    const KEY_ARITY: usize = 2;

    fn key_parts(&self) -> Vec<&str> {
        vec![self.first_name.as_str(), self.last_name.as_str()]
    }

    fn snapshot(store: &CacheStore) -> Result<Vector<Self>> {
        store.medical_records()
    }

    fn update<F>(store: &CacheStore, f: F) -> Result<bool>
    where
        F: FnOnce(Vector<Self>) -> Option<Vector<Self>>,
    {
        store.update_medical_records(f)
    }
}

pub type MedicalRecordRepository = EntityRepository<MedicalRecord>;

impl EntityRepository<MedicalRecord> {
    pub fn find_by_name(&self, first_name: &str, last_name: &str) -> Result<Option<MedicalRecord>> {
        self.find_by_key(&[first_name, last_name])
    }

    pub fn delete_by_name(&self, first_name: &str, last_name: &str) -> Result<bool> {
        self.delete_by_key(&[first_name, last_name])
    }
}
