//! Cross-entity views assembled from the repositories.
//!
//! Nothing here touches the cache store directly. A key that matches nothing
//! yields an empty view, never an error.

pub mod age;
pub mod views;

use crate::core::key;
use crate::core::{MedicalRecord, Person, Result};
use crate::repository::Repositories;
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

pub use views::{
    Child, ChildAlert, FireReport, Household, HouseholdMember, PersonInfo, Resident,
    StationCoverage, StationResident,
};

/// Source of "today" for age computation.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub struct AlertService {
    repos: Repositories,
    clock: Clock,
}

impl AlertService {
    pub fn new(repos: Repositories) -> Self {
        Self::with_clock(repos, || Local::now().date_naive())
    }

    pub fn with_clock<C>(repos: Repositories, clock: C) -> Self
    where
        C: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        Self {
            repos,
            clock: Arc::new(clock),
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Residents served by `station`, with adult/child tallies.
    pub fn station_coverage(&self, station: &str) -> Result<StationCoverage> {
        let addresses = self.repos.stations.find_addresses_by_station(station)?;
        let people = self.repos.people.find_by_addresses(&addresses)?;
        let today = (self.clock)();

        let mut child_count = 0;
        let mut residents = Vec::with_capacity(people.len());
        for person in people {
            if age::is_child(self.age_of(&person, today)?) {
                child_count += 1;
            }
            residents.push(StationResident {
                first_name: person.first_name,
                last_name: person.last_name,
                address: person.address,
                phone: person.phone,
            });
        }

        Ok(StationCoverage {
            station: station.trim().to_string(),
            adult_count: residents.len() - child_count,
            child_count,
            residents,
        })
    }

    /// Children at `address` and everyone else in the household.
    pub fn child_alert(&self, address: &str) -> Result<ChildAlert> {
        let today = (self.clock)();
        let mut alert = ChildAlert::default();

        for person in self.repos.people.find_by_address(address)? {
            match self.age_of(&person, today)? {
                Some(years) if years <= age::CHILD_MAX_AGE => alert.children.push(Child {
                    first_name: person.first_name,
                    last_name: person.last_name,
                    age: years,
                }),
                _ => alert.household_members.push(HouseholdMember {
                    first_name: person.first_name,
                    last_name: person.last_name,
                }),
            }
        }

        Ok(alert)
    }

    /// Distinct phone numbers of everyone served by `station`, first seen first.
    pub fn phone_alert(&self, station: &str) -> Result<Vec<String>> {
        let addresses = self.repos.stations.find_addresses_by_station(station)?;
        let people = self.repos.people.find_by_addresses(&addresses)?;
        Ok(distinct(people.into_iter().map(|person| person.phone)))
    }

    pub fn fire(&self, address: &str) -> Result<FireReport> {
        let station = self.repos.stations.find_station_by_address(address)?;
        let residents = self.residents_at(address, (self.clock)())?;
        Ok(FireReport { station, residents })
    }

    /// Households served by any of `stations`, ordered by address.
    pub fn flood<I, S>(&self, stations: I) -> Result<Vec<Household>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut addresses: BTreeMap<String, String> = BTreeMap::new();
        for station in stations {
            for address in self
                .repos
                .stations
                .find_addresses_by_station(station.as_ref())?
            {
                addresses.entry(key::normalize(&address)).or_insert(address);
            }
        }

        let today = (self.clock)();
        addresses
            .into_values()
            .map(|address| {
                let residents = self.residents_at(&address, today)?;
                Ok(Household { address, residents })
            })
            .collect()
    }

    pub fn person_info(&self, last_name: &str) -> Result<Vec<PersonInfo>> {
        let today = (self.clock)();
        self.repos
            .people
            .find_by_last_name(last_name)?
            .into_iter()
            .map(|person| {
                let (age, medications, allergies) = self.medical_details(&person, today)?;
                Ok(PersonInfo {
                    first_name: person.first_name,
                    last_name: person.last_name,
                    address: person.address,
                    age,
                    email: person.email,
                    medications,
                    allergies,
                })
            })
            .collect()
    }

    /// Distinct emails of the residents of `city`, first seen first.
    pub fn community_email(&self, city: &str) -> Result<Vec<String>> {
        let people = self.repos.people.find_by_city(city)?;
        Ok(distinct(people.into_iter().map(|person| person.email)))
    }

    fn residents_at(&self, address: &str, today: NaiveDate) -> Result<Vec<Resident>> {
        self.repos
            .people
            .find_by_address(address)?
            .into_iter()
            .map(|person| {
                let (age, medications, allergies) = self.medical_details(&person, today)?;
                Ok(Resident {
                    first_name: person.first_name,
                    last_name: person.last_name,
                    phone: person.phone,
                    age,
                    medications,
                    allergies,
                })
            })
            .collect()
    }

    fn medical_record_of(&self, person: &Person) -> Result<Option<MedicalRecord>> {
        self.repos
            .medical_records
            .find_by_name(&person.first_name, &person.last_name)
    }

    fn medical_details(
        &self,
        person: &Person,
        today: NaiveDate,
    ) -> Result<(Option<u32>, Vec<String>, Vec<String>)> {
        Ok(match self.medical_record_of(person)? {
            Some(record) => (
                age::age_from_birthdate(&record.birthdate, today),
                record.medications,
                record.allergies,
            ),
            None => (None, Vec::new(), Vec::new()),
        })
    }

    fn age_of(&self, person: &Person, today: NaiveDate) -> Result<Option<u32>> {
        Ok(self
            .medical_record_of(person)?
            .and_then(|record| age::age_from_birthdate(&record.birthdate, today)))
    }
}

fn distinct<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .filter(|value| seen.insert(value.trim().to_string()))
        .collect()
}
