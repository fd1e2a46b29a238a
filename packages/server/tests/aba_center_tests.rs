//! ABA center listing, search and staff-only writes

mod common;

use crate::common::*;
use axum::http::{Method, StatusCode};
use care_directory::domains::aba_centers::AbaCenter;
use care_directory::kernel::{InMemoryStore, TestDependencies};
use serde_json::json;

const WRITE_ABA_CENTERS: &str = "write:aba-centers";

fn harness(centers: Vec<AbaCenter>) -> TestHarness {
    TestHarness::new(TestDependencies::new().with_aba_centers(InMemoryStore::new(centers)))
}

fn fixture_centers() -> Vec<AbaCenter> {
    let mut pasadena = aba_center("Bright Steps ABA", "Pasadena", "In-Home");
    pasadena.insurance_accepted = Some("Anthem, Blue Shield".to_string());
    pasadena.medi_cal_plans = Some("L.A. Care".to_string());

    let mut south_pasadena = aba_center("Arroyo Behavioral", "South Pasadena", "Clinic");
    south_pasadena.insurance_accepted = Some("Kaiser".to_string());
    south_pasadena.medi_cal_plans = Some("".to_string());

    let mut long_beach = aba_center("Harbor Autism Services", "Long Beach", "In-Home");
    long_beach.insurance_accepted = Some("Blue Shield".to_string());

    vec![pasadena, south_pasadena, long_beach]
}

fn new_center() -> serde_json::Value {
    json!({
        "name": " Valley ABA Group ",
        "street": "14500 Ventura Blvd",
        "city": "Sherman Oaks",
        "zip": "91403",
        "phone": "(818) 555-0142",
        "serviceType": "Clinic",
        "waitlistAvailability": "3 months",
        "mediCalPlans": "Health Net"
    })
}

fn names(response: &TestResponse) -> Vec<&str> {
    response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn listing_is_sorted_by_name() {
    let harness = harness(fixture_centers());

    let response = harness.get("/api/aba-centers").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        names(&response),
        vec!["Arroyo Behavioral", "Bright Steps ABA", "Harbor Autism Services"]
    );
    assert_eq!(response.body[1]["serviceType"], "In-Home");
}

#[tokio::test]
async fn search_by_city_is_a_substring_match() {
    let harness = harness(fixture_centers());

    let response = harness.get("/api/aba-centers/search?city=pasadena").await;

    assert_eq!(names(&response), vec!["Arroyo Behavioral", "Bright Steps ABA"]);
}

#[tokio::test]
async fn search_criteria_compose() {
    let harness = harness(fixture_centers());

    let response = harness
        .get("/api/aba-centers/search?service_type=In-Home&insurance=blue%20shield")
        .await;
    assert_eq!(names(&response), vec!["Bright Steps ABA", "Harbor Autism Services"]);

    let response = harness
        .get("/api/aba-centers/search?service_type=In-Home&medi_cal=true")
        .await;
    assert_eq!(names(&response), vec!["Bright Steps ABA"]);
}

#[tokio::test]
async fn medi_cal_filter_only_applies_to_true() {
    let harness = harness(fixture_centers());

    let response = harness.get("/api/aba-centers/search?medi_cal=yes").await;

    assert_eq!(response.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn lookup_by_id() {
    let centers = fixture_centers();
    let id = centers[2].id;
    let harness = harness(centers);

    let response = harness.get(&format!("/api/aba-centers/{}", id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Harbor Autism Services");

    let missing = harness
        .get("/api/aba-centers/00000000-0000-4000-8000-000000000000")
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.error_message(), "ABA center not found");

    let malformed = harness.get("/api/aba-centers/42").await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_requires_the_write_capability() {
    let harness = harness(Vec::new());

    let anonymous = harness
        .send(Method::POST, "/api/aba-centers", None, Some(new_center()))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let wrong_capability = bearer(3, &["write:resources"]);
    let forbidden = harness
        .send(
            Method::POST,
            "/api/aba-centers",
            Some(&wrong_capability),
            Some(new_center()),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    assert_eq!(harness.get("/api/aba-centers").await.body, json!([]));
}

#[tokio::test]
async fn create_update_delete_round() {
    let harness = harness(Vec::new());
    let staff = bearer(3, &[WRITE_ABA_CENTERS]);

    let created = harness
        .send(Method::POST, "/api/aba-centers", Some(&staff), Some(new_center()))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["name"], "Valley ABA Group");
    assert_eq!(created.body["waitlistAvailability"], "3 months");
    let id = created.body["id"].as_str().unwrap().to_string();
    let uri = format!("/api/aba-centers/{}", id);

    let mut changes = new_center();
    changes["waitlistAvailability"] = json!("Open");
    let updated = harness
        .send(Method::PUT, &uri, Some(&staff), Some(changes))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["waitlistAvailability"], "Open");
    assert_eq!(updated.body["createdAt"], created.body["createdAt"]);

    let deleted = harness.send(Method::DELETE, &uri, Some(&staff), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(harness.get(&uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_missing_required_fields() {
    let harness = harness(Vec::new());
    let staff = bearer(3, &[WRITE_ABA_CENTERS]);

    let mut body = new_center();
    body["phone"] = json!("  ");
    let response = harness
        .send(Method::POST, "/api/aba-centers", Some(&staff), Some(body))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_message(), "phone is required");
}

#[tokio::test]
async fn store_failure_is_500() {
    let harness = TestHarness::new(TestDependencies::unavailable());

    let response = harness.get("/api/aba-centers/search?city=Pasadena").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_message(), "Internal server error");
}
