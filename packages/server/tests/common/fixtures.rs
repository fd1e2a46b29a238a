//! Test fixtures for building directory records.
//!
//! Records are built directly; the harness serves them from in-memory stores.

use care_directory::domains::aba_centers::AbaCenter;
use care_directory::domains::providers::Provider;
use care_directory::domains::regional_centers::RegionalCenter;
use care_directory::domains::resources::Resource;
use care_directory::domains::users::User;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

/// Downtown Los Angeles, the origin used across search tests
pub const ORIGIN_LAT: f64 = 34.05;
pub const ORIGIN_LNG: f64 = -118.25;

/// Latitude step between consecutive fixtures (about 0.14 miles)
pub const LAT_STEP: f64 = 0.002;

/// A resource with typed coordinates
pub fn resource_at(id: &str, latitude: f64, longitude: f64) -> Resource {
    let now = Utc::now();
    Resource {
        id: id.to_string(),
        name: format!("Resource {}", id),
        description: None,
        address: None,
        latitude: Some(latitude),
        longitude: Some(longitude),
        diagnoses: Vec::new(),
        contact_info: json!({}),
        created_at: now,
        updated_at: now,
    }
}

/// A legacy resource whose only location is its free-text address
pub fn resource_with_address(id: &str, address: &str) -> Resource {
    Resource {
        address: Some(address.to_string()),
        latitude: None,
        longitude: None,
        ..resource_at(id, 0.0, 0.0)
    }
}

pub fn with_diagnoses(mut resource: Resource, diagnoses: &[&str]) -> Resource {
    resource.diagnoses = diagnoses.iter().map(|d| d.to_string()).collect();
    resource
}

/// `count` resources stepping north from the origin, `resource-1` nearest
pub fn resources_stepping_north(count: usize) -> Vec<Resource> {
    (1..=count)
        .map(|i| {
            resource_at(
                &format!("resource-{}", i),
                ORIGIN_LAT + i as f64 * LAT_STEP,
                ORIGIN_LNG,
            )
        })
        .collect()
}

/// A regional center located only by its legacy free-text field
pub fn regional_center(id: i32, name: &str, location_text: Option<&str>) -> RegionalCenter {
    let now = Utc::now();
    RegionalCenter {
        id,
        regional_center: name.to_string(),
        office_type: Some("Main".to_string()),
        address: Some(format!("{} Wilshire Blvd", 1000 + id)),
        suite: None,
        city: Some("Los Angeles".to_string()),
        state: Some("CA".to_string()),
        zip_code: Some("90017".to_string()),
        telephone: Some("(213) 555-0100".to_string()),
        website: None,
        county_served: Some("Los Angeles".to_string()),
        los_angeles_health_district: Some("Central".to_string()),
        location_coordinates: location_text.map(String::from),
        latitude: None,
        longitude: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn user(id: i32, email: &str) -> User {
    let now = Utc::now();
    User {
        id,
        email: email.to_string(),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        created_at: now,
        updated_at: now,
    }
}

/// An ABA center in `city`; optional details are left empty
pub fn aba_center(name: &str, city: &str, service_type: &str) -> AbaCenter {
    let now = Utc::now();
    AbaCenter {
        id: Uuid::new_v4(),
        name: name.to_string(),
        street: "500 Main St".to_string(),
        city: city.to_string(),
        zip: "90012".to_string(),
        phone: "(213) 555-0100".to_string(),
        service_type: service_type.to_string(),
        waitlist_availability: None,
        waitlist_notes: None,
        dx_verification: None,
        insurance_accepted: None,
        medi_cal_plans: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// A provider at the given coordinates; pass 0.0 for "not geocoded"
pub fn provider(id: i32, latitude: f64, longitude: f64, areas: &str) -> Provider {
    let now = Utc::now();
    Provider {
        id,
        name: format!("Provider {}", id),
        phone: None,
        address: None,
        coverage_areas: None,
        center_based_services: None,
        areas: Some(areas.to_string()),
        latitude: Some(latitude),
        longitude: Some(longitude),
        created_at: now,
        updated_at: now,
    }
}
