use super::{AppState, Result, WebError, run_blocking};
use crate::core::key::is_blank;
use crate::core::{MedicalRecord, Person, StationMapping};
use crate::service::{ChildAlert, FireReport, Household, PersonInfo};
use crate::storage::{CollectionCounts, PersistenceHealth};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub counts: CollectionCounts,
    pub persistence: PersistenceHealth,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NameQuery {
    fn required(self) -> Result<(String, String)> {
        match (self.first_name, self.last_name) {
            (Some(first), Some(last)) if !is_blank(&first) && !is_blank(&last) => Ok((first, last)),
            _ => Err(WebError::input("firstName and lastName are required")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestationQuery {
    pub station_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhoneAlertQuery {
    pub firestation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FloodQuery {
    pub stations: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastNameQuery {
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(value) if !is_blank(&value) => Ok(value),
        _ => Err(WebError::input(format!("{name} is required"))),
    }
}

fn body<T>(payload: Option<T>) -> Result<T> {
    payload.ok_or_else(|| WebError::input("request body must not be null"))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthReport>> {
    let report = run_blocking(move || {
        Ok(HealthReport {
            counts: state.store.counts()?,
            persistence: state.store.health()?,
        })
    })
    .await?;
    Ok(Json(report))
}

// ----------------------------------------------------------------------------
// Person
// ----------------------------------------------------------------------------

pub async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<Person>>> {
    let people = run_blocking(move || Ok(state.repos.people.find_all()?)).await?;
    Ok(Json(people))
}

pub async fn create_person(
    State(state): State<AppState>,
    Json(payload): Json<Option<Person>>,
) -> Result<(StatusCode, Json<Person>)> {
    let person = body(payload)?;
    let person = run_blocking(move || Ok(state.repos.people.save(person)?)).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn update_person(
    State(state): State<AppState>,
    Json(payload): Json<Option<Person>>,
) -> Result<Json<Person>> {
    let person = body(payload)?;
    if is_blank(&person.first_name) || is_blank(&person.last_name) {
        return Err(WebError::input("firstName and lastName are required"));
    }
    let person = run_blocking(move || {
        let people = &state.repos.people;
        if !people.exists_by_key(&[person.first_name.as_str(), person.last_name.as_str()])? {
            return Err(WebError::not_found("person not found"));
        }
        Ok(people.save(person)?)
    })
    .await?;
    Ok(Json(person))
}

pub async fn delete_person(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<StatusCode> {
    let (first, last) = query.required()?;
    let deleted =
        run_blocking(move || Ok(state.repos.people.delete_by_name(&first, &last)?)).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WebError::not_found("person not found"))
    }
}

// ----------------------------------------------------------------------------
// Fire station mapping
// ----------------------------------------------------------------------------

/// Station coverage when `stationNumber` is given, otherwise the full mapping list.
pub async fn get_firestation(
    State(state): State<AppState>,
    Query(query): Query<FirestationQuery>,
) -> Result<Response> {
    if query.station_number.is_some() {
        let station = required(query.station_number, "stationNumber")?;
        let coverage = run_blocking(move || Ok(state.alerts.station_coverage(&station)?)).await?;
        return Ok(Json(coverage).into_response());
    }
    let mappings = run_blocking(move || Ok(state.repos.stations.find_all()?)).await?;
    Ok(Json(mappings).into_response())
}

pub async fn create_station_mapping(
    State(state): State<AppState>,
    Json(payload): Json<Option<StationMapping>>,
) -> Result<(StatusCode, Json<StationMapping>)> {
    let mapping = body(payload)?;
    let mapping = run_blocking(move || Ok(state.repos.stations.save(mapping)?)).await?;
    Ok((StatusCode::CREATED, Json(mapping)))
}

pub async fn update_station_mapping(
    State(state): State<AppState>,
    Json(payload): Json<Option<StationMapping>>,
) -> Result<Json<StationMapping>> {
    let mapping = body(payload)?;
    if is_blank(&mapping.address) {
        return Err(WebError::input("address is required"));
    }
    let mapping = run_blocking(move || {
        let stations = &state.repos.stations;
        if !stations.exists_by_key(&[mapping.address.as_str()])? {
            return Err(WebError::not_found("fire station mapping not found"));
        }
        Ok(stations.save(mapping)?)
    })
    .await?;
    Ok(Json(mapping))
}

pub async fn delete_station_mapping(
    State(state): State<AppState>,
    Query(query): Query<FirestationQuery>,
) -> Result<StatusCode> {
    let address = required(query.address, "address")?;
    let deleted =
        run_blocking(move || Ok(state.repos.stations.delete_by_address(&address)?)).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WebError::not_found("fire station mapping not found"))
    }
}

// ----------------------------------------------------------------------------
// Medical record
// ----------------------------------------------------------------------------

pub async fn list_medical_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<MedicalRecord>>> {
    let records = run_blocking(move || Ok(state.repos.medical_records.find_all()?)).await?;
    Ok(Json(records))
}

pub async fn create_medical_record(
    State(state): State<AppState>,
    Json(payload): Json<Option<MedicalRecord>>,
) -> Result<(StatusCode, Json<MedicalRecord>)> {
    let record = body(payload)?;
    let record = run_blocking(move || Ok(state.repos.medical_records.save(record)?)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_medical_record(
    State(state): State<AppState>,
    Json(payload): Json<Option<MedicalRecord>>,
) -> Result<Json<MedicalRecord>> {
    let record = body(payload)?;
    if is_blank(&record.first_name) || is_blank(&record.last_name) {
        return Err(WebError::input("firstName and lastName are required"));
    }
    let record = run_blocking(move || {
        let records = &state.repos.medical_records;
        if !records.exists_by_key(&[record.first_name.as_str(), record.last_name.as_str()])? {
            return Err(WebError::not_found("medical record not found"));
        }
        Ok(records.save(record)?)
    })
    .await?;
    Ok(Json(record))
}

pub async fn delete_medical_record(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<StatusCode> {
    let (first, last) = query.required()?;
    let deleted =
        run_blocking(move || Ok(state.repos.medical_records.delete_by_name(&first, &last)?))
            .await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WebError::not_found("medical record not found"))
    }
}

// ----------------------------------------------------------------------------
// Alerts
// ----------------------------------------------------------------------------

pub async fn child_alert(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<ChildAlert>> {
    let address = required(query.address, "address")?;
    let alert = run_blocking(move || Ok(state.alerts.child_alert(&address)?)).await?;
    Ok(Json(alert))
}

pub async fn phone_alert(
    State(state): State<AppState>,
    Query(query): Query<PhoneAlertQuery>,
) -> Result<Json<Vec<String>>> {
    let station = required(query.firestation, "firestation")?;
    let phones = run_blocking(move || Ok(state.alerts.phone_alert(&station)?)).await?;
    Ok(Json(phones))
}

pub async fn fire(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<FireReport>> {
    let address = required(query.address, "address")?;
    let report = run_blocking(move || Ok(state.alerts.fire(&address)?)).await?;
    Ok(Json(report))
}

pub async fn flood(
    State(state): State<AppState>,
    Query(query): Query<FloodQuery>,
) -> Result<Json<Vec<Household>>> {
    let raw = required(query.stations, "stations")?;
    let stations: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|station| !station.is_empty())
        .map(str::to_string)
        .collect();
    if stations.is_empty() {
        return Err(WebError::input("stations is required"));
    }
    let households = run_blocking(move || Ok(state.alerts.flood(stations)?)).await?;
    Ok(Json(households))
}

pub async fn person_info(
    State(state): State<AppState>,
    Query(query): Query<LastNameQuery>,
) -> Result<Json<Vec<PersonInfo>>> {
    let last_name = required(query.last_name, "lastName")?;
    let people = run_blocking(move || Ok(state.alerts.person_info(&last_name)?)).await?;
    Ok(Json(people))
}

pub async fn community_email(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<Vec<String>>> {
    let city = required(query.city, "city")?;
    let emails = run_blocking(move || Ok(state.alerts.community_email(&city)?)).await?;
    Ok(Json(emails))
}
