use serde::{Deserialize, Serialize};

/// A resident known to the emergency services.
///
/// Identified by `(first_name, last_name)`, compared case-insensitively.
/// The zip code is written as `zip`; `zipCode` is accepted on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    #[serde(alias = "zipCode")]
    pub zip: String,
    pub phone: String,
    pub email: String,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn zip(mut self, zip: impl Into<String>) -> Self {
        self.zip = zip.into();
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Maps an address to the number of the fire station that covers it.
///
/// Identified by `address`. The station number is written as `station`;
/// `stationNumber` is accepted on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StationMapping {
    pub address: String,
    #[serde(alias = "stationNumber")]
    pub station: String,
}

impl StationMapping {
    pub fn new(address: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            station: station.into(),
        }
    }
}

/// Medical data attached to a person by name.
///
/// `medications` and `allergies` keep their order through every round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicalRecord {
    pub first_name: String,
    pub last_name: String,
    /// `MM/dd/yyyy`
    pub birthdate: String,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
}

impl MedicalRecord {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthdate: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthdate: birthdate.into(),
            ..Self::default()
        }
    }

    pub fn medications<I, S>(mut self, medications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.medications = medications.into_iter().map(Into::into).collect();
        self
    }

    pub fn allergies<I, S>(mut self, allergies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allergies = allergies.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_json_uses_camel_case() {
        let person = Person::new("John", "Boyd")
            .address("1509 Culver St")
            .city("Culver")
            .zip("97451")
            .phone("841-874-6512")
            .email("jaboyd@email.com");

        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["lastName"], "Boyd");
        assert_eq!(json["zip"], "97451");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let person: Person = serde_json::from_str(r#"{"firstName":"Tenley"}"#).unwrap();
        assert_eq!(person.first_name, "Tenley");
        assert!(person.address.is_empty());

        let record: MedicalRecord =
            serde_json::from_str(r#"{"firstName":"Tenley","lastName":"Boyd"}"#).unwrap();
        assert!(record.medications.is_empty());
        assert!(record.allergies.is_empty());
    }

    #[test]
    fn test_field_aliases_are_accepted() {
        let person: Person = serde_json::from_str(r#"{"zipCode":"97451"}"#).unwrap();
        assert_eq!(person.zip, "97451");

        let mapping: StationMapping =
            serde_json::from_str(r#"{"address":"29 15th St","stationNumber":"2"}"#).unwrap();
        assert_eq!(mapping.station, "2");

        let written = serde_json::to_value(&mapping).unwrap();
        assert_eq!(written["station"], "2");
        assert!(written.get("stationNumber").is_none());
        let written = serde_json::to_value(&person).unwrap();
        assert!(written.get("zipCode").is_none());
    }
}
