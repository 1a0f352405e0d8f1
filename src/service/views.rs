use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationResident {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationCoverage {
    pub station: String,
    pub residents: Vec<StationResident>,
    pub adult_count: usize,
    pub child_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdMember {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildAlert {
    pub children: Vec<Child>,
    pub household_members: Vec<HouseholdMember>,
}

/// A resident with the medical details responders need on site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub age: Option<u32>,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireReport {
    pub station: Option<String>,
    pub residents: Vec<Resident>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub address: String,
    pub residents: Vec<Resident>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonInfo {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub age: Option<u32>,
    pub email: String,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
}
