use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use chrono::NaiveDate;
use safetynet::storage::{CacheStore, SeedSource};
use safetynet::{AlertService, AppState, Repositories, StoreConfig, build_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const SEED: &str = r#"{
  "persons": [
    { "firstName": "John", "lastName": "Boyd", "address": "1509 Culver St", "city": "Culver",
      "zip": "97451", "phone": "841-874-6512", "email": "jaboyd@email.com" },
    { "firstName": "Tenley", "lastName": "Boyd", "address": "1509 Culver St", "city": "Culver",
      "zip": "97451", "phone": "841-874-6512", "email": "tenz@email.com" },
    { "firstName": "Peter", "lastName": "Duncan", "address": "644 Gershwin Cir", "city": "Culver",
      "zip": "97451", "phone": "841-874-6544", "email": "jaboyd@email.com" }
  ],
  "firestations": [
    { "address": "1509 Culver St", "station": "3" },
    { "address": "644 Gershwin Cir", "station": "1" }
  ],
  "medicalrecords": [
    { "firstName": "John", "lastName": "Boyd", "birthdate": "03/06/1984",
      "medications": ["aznol:350mg", "hydrapermazol:100mg"], "allergies": ["nillacilan"] },
    { "firstName": "Tenley", "lastName": "Boyd", "birthdate": "02/18/2012",
      "medications": [], "allergies": ["peanut"] },
    { "firstName": "Peter", "lastName": "Duncan", "birthdate": "09/06/2000",
      "medications": [], "allergies": ["shellfish"] }
  ]
}"#;

struct TestApp {
    _dir: TempDir,
    config: StoreConfig,
    router: axum::Router,
}

fn app() -> TestApp {
    let dir = TempDir::new().expect("temp dir");
    let config = StoreConfig::new(dir.path().join("store.json"))
        .seed(SeedSource::Inline(SEED.to_string()));
    let store = Arc::new(CacheStore::open(&config).expect("store should open"));
    let repos = Repositories::new(Arc::clone(&store));
    let alerts = AlertService::with_clock(repos, || {
        NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date")
    });
    TestApp {
        _dir: dir,
        config,
        router: build_router(AppState::with_alerts(store, alerts)),
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    if body.is_empty() {
        return (status, Value::Null);
    }

    let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
    (status, json)
}

async fn send_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    payload: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request should build");
    send(app, request).await
}

async fn send_empty(app: &axum::Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

fn names(values: &Value) -> Vec<String> {
    values
        .as_array()
        .expect("array expected")
        .iter()
        .map(|value| value["firstName"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_counts_and_clean_persistence() {
    let app = app();

    let (status, body) = send_empty(&app.router, Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["people"], 3);
    assert_eq!(body["counts"]["stationMappings"], 2);
    assert_eq!(body["counts"]["medicalRecords"], 3);
    assert_eq!(body["persistence"]["lastWriteFailed"], false);
}

#[tokio::test]
async fn person_crud_round_trip() {
    let app = app();
    let router = &app.router;

    let (status, created) = send_json(
        router,
        Method::POST,
        "/person",
        json!({
            "firstName": "Jane",
            "lastName": "Roe",
            "address": "1 Main St",
            "city": "Culver",
            "zip": "97451",
            "phone": "841-000-0000",
            "email": "jroe@email.com"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["firstName"], "Jane");

    let (status, people) = send_empty(router, Method::GET, "/person").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&people), vec!["John", "Tenley", "Peter", "Jane"]);

    let (status, updated) = send_json(
        router,
        Method::PUT,
        "/person",
        json!({ "firstName": "JANE", "lastName": " roe", "address": "2 Main St" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["address"], "2 Main St");

    let (status, _) = send_empty(
        router,
        Method::DELETE,
        "/person?firstName=jane&lastName=ROE",
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_empty(
        router,
        Method::DELETE,
        "/person?firstName=jane&lastName=ROE",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn put_for_unknown_person_is_not_found() {
    let app = app();

    let (status, body) = send_json(
        &app.router,
        Method::PUT,
        "/person",
        json!({ "firstName": "No", "lastName": "Body" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = app();
    let router = &app.router;

    let (status, body) = send_json(router, Method::POST, "/person", Value::Null).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");

    let (status, body) = send_json(
        router,
        Method::POST,
        "/person",
        json!({ "firstName": "  ", "lastName": "Roe" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");

    let (status, _) = send_json(
        router,
        Method::POST,
        "/medicalRecord",
        json!({ "firstName": "", "lastName": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_empty(router, Method::DELETE, "/person?firstName=John").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, people) = send_empty(router, Method::GET, "/person").await;
    assert_eq!(people.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn writes_are_durable_across_restart() {
    let app = app();

    let (status, _) = send_json(
        &app.router,
        Method::POST,
        "/firestation",
        json!({ "address": "9 Elm St", "stationNumber": "4" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_empty(
        &app.router,
        Method::DELETE,
        "/medicalRecord?firstName=peter&lastName=duncan",
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let reopened = safetynet::open(&app.config).expect("store should reopen");
    assert_eq!(
        reopened.stations.find_station_by_address("9 ELM ST").unwrap(),
        Some("4".to_string())
    );
    assert!(
        reopened
            .medical_records
            .find_by_name("Peter", "Duncan")
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn firestation_update_and_listing() {
    let app = app();
    let router = &app.router;

    let (status, updated) = send_json(
        router,
        Method::PUT,
        "/firestation",
        json!({ "address": "644 GERSHWIN CIR", "station": "2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["station"], "2");

    let (status, all) = send_empty(router, Method::GET, "/firestation").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let (status, _) = send_json(
        router,
        Method::PUT,
        "/firestation",
        json!({ "address": "0 Nowhere", "station": "2" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn station_coverage_counts_adults_and_children() {
    let app = app();

    let (status, body) = send_empty(&app.router, Method::GET, "/firestation?stationNumber=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["station"], "3");
    assert_eq!(names(&body["residents"]), vec!["John", "Tenley"]);
    assert_eq!(body["adultCount"], 1);
    assert_eq!(body["childCount"], 1);
}

#[tokio::test]
async fn child_alert_splits_household() {
    let app = app();
    let router = &app.router;

    let (status, body) =
        send_empty(router, Method::GET, "/childAlert?address=1509%20culver%20st").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["children"][0]["firstName"], "Tenley");
    assert_eq!(body["children"][0]["age"], 13);
    assert_eq!(names(&body["householdMembers"]), vec!["John"]);

    let (status, body) =
        send_empty(router, Method::GET, "/childAlert?address=644%20Gershwin%20Cir").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["children"].as_array().is_some_and(Vec::is_empty));
}

#[tokio::test]
async fn phone_alert_deduplicates_numbers() {
    let app = app();

    let (status, body) = send_empty(&app.router, Method::GET, "/phoneAlert?firestation=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["841-874-6512"]));
}

#[tokio::test]
async fn fire_lists_station_and_medical_details() {
    let app = app();
    let router = &app.router;

    let (status, body) =
        send_empty(router, Method::GET, "/fire?address=1509%20Culver%20St").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["station"], "3");
    assert_eq!(body["residents"][0]["firstName"], "John");
    assert_eq!(body["residents"][0]["age"], 41);
    assert_eq!(
        body["residents"][0]["medications"],
        json!(["aznol:350mg", "hydrapermazol:100mg"])
    );

    let (status, body) = send_empty(router, Method::GET, "/fire?address=0%20Nowhere").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["station"], Value::Null);
    assert!(body["residents"].as_array().is_some_and(Vec::is_empty));
}

#[tokio::test]
async fn flood_groups_households_by_address() {
    let app = app();
    let router = &app.router;

    let (status, body) =
        send_empty(router, Method::GET, "/flood/stations?stations=1,%203,3").await;
    assert_eq!(status, StatusCode::OK);
    let households = body.as_array().expect("array expected");
    assert_eq!(households.len(), 2);
    assert_eq!(households[0]["address"], "1509 Culver St");
    assert_eq!(households[0]["residents"].as_array().map(Vec::len), Some(2));
    assert_eq!(households[1]["address"], "644 Gershwin Cir");

    let (status, _) = send_empty(router, Method::GET, "/flood/stations?stations=,").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn person_info_and_community_email() {
    let app = app();
    let router = &app.router;

    let (status, body) = send_empty(router, Method::GET, "/personInfo?lastName=BOYD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["John", "Tenley"]);
    assert_eq!(body[1]["age"], 13);
    assert_eq!(body[1]["allergies"], json!(["peanut"]));

    let (status, body) = send_empty(router, Method::GET, "/communityEmail?city=culver").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["jaboyd@email.com", "tenz@email.com"]));

    let (status, _) = send_empty(router, Method::GET, "/communityEmail").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_writes_and_reads_all_complete() {
    let app = app();

    let mut handles = Vec::new();
    for i in 0..16 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            send_json(
                &router,
                Method::POST,
                "/person",
                json!({ "firstName": format!("Writer{i}"), "lastName": "Load", "city": "Culver" }),
            )
            .await
            .0
        }));
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            send_empty(&router, Method::GET, "/health").await.0
        }));
    }

    for handle in handles {
        let status = handle.await.expect("request task should finish");
        assert!(status == StatusCode::CREATED || status == StatusCode::OK);
    }

    let (status, people) = send_empty(&app.router, Method::GET, "/person").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(people.as_array().map(Vec::len), Some(3 + 16));

    let reopened = safetynet::open(&app.config).expect("store should reopen");
    assert_eq!(reopened.people.find_by_last_name("load").unwrap().len(), 16);
}
