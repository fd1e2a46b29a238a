//! ABA center model - applied behavior analysis providers with waitlist and
//! insurance details
//!
//! JSON uses camelCase field names, matching what map clients already send.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domains::search::{contains_ignore_case, like_pattern};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AbaCenter {
    pub id: Uuid,
    pub name: String,
    pub street: String,
    pub city: String,
    pub zip: String,
    pub phone: String,
    pub service_type: String,
    pub waitlist_availability: Option<String>,
    pub waitlist_notes: Option<String>,
    pub dx_verification: Option<String>,
    pub insurance_accepted: Option<String>,
    pub medi_cal_plans: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbaCenterValidationError {
    #[error("{0} is required")]
    Required(&'static str),
}

/// Body of create and update requests
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbaCenterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub waitlist_availability: Option<String>,
    #[serde(default)]
    pub waitlist_notes: Option<String>,
    #[serde(default)]
    pub dx_verification: Option<String>,
    #[serde(default)]
    pub insurance_accepted: Option<String>,
    #[serde(default)]
    pub medi_cal_plans: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AbaCenterInput {
    /// Trim the required fields and reject any that are blank
    pub fn normalized(mut self) -> Result<Self, AbaCenterValidationError> {
        for (field, value) in [
            ("name", &mut self.name),
            ("street", &mut self.street),
            ("city", &mut self.city),
            ("zip", &mut self.zip),
            ("phone", &mut self.phone),
            ("serviceType", &mut self.service_type),
        ] {
            *value = value.trim().to_string();
            if value.is_empty() {
                return Err(AbaCenterValidationError::Required(field));
            }
        }
        Ok(self)
    }
}

/// Search criteria; absent criteria match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbaCenterSearch {
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    /// Exact service type
    pub service_type: Option<String>,
    /// Case-insensitive substring of the accepted insurance list
    pub insurance: Option<String>,
    /// Only centers listing at least one Medi-Cal plan
    pub medi_cal_only: bool,
}

impl AbaCenterSearch {
    pub fn matches(&self, center: &AbaCenter) -> bool {
        contains_ignore_case(Some(&center.city), self.city.as_deref())
            && self
                .service_type
                .as_deref()
                .map_or(true, |wanted| center.service_type == wanted)
            && contains_ignore_case(center.insurance_accepted.as_deref(), self.insurance.as_deref())
            && (!self.medi_cal_only || center.accepts_medi_cal())
    }
}

impl AbaCenter {
    /// Build an unsaved center from validated input
    pub fn from_input(id: Uuid, input: AbaCenterInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            street: input.street,
            city: input.city,
            zip: input.zip,
            phone: input.phone,
            service_type: input.service_type,
            waitlist_availability: input.waitlist_availability,
            waitlist_notes: input.waitlist_notes,
            dx_verification: input.dx_verification,
            insurance_accepted: input.insurance_accepted,
            medi_cal_plans: input.medi_cal_plans,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn accepts_medi_cal(&self) -> bool {
        self.medi_cal_plans
            .as_deref()
            .is_some_and(|plans| !plans.trim().is_empty())
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let centers =
            sqlx::query_as::<_, Self>("SELECT * FROM aba_centers ORDER BY name ASC, id ASC")
                .fetch_all(pool)
                .await?;
        Ok(centers)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let center = sqlx::query_as::<_, Self>("SELECT * FROM aba_centers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(center)
    }

    pub async fn search(criteria: &AbaCenterSearch, pool: &PgPool) -> Result<Vec<Self>> {
        let centers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM aba_centers
            WHERE ($1::text IS NULL OR city ILIKE $1)
              AND ($2::text IS NULL OR service_type = $2)
              AND ($3::text IS NULL OR insurance_accepted ILIKE $3)
              AND (NOT $4 OR btrim(coalesce(medi_cal_plans, '')) <> '')
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(like_pattern(criteria.city.as_deref()))
        .bind(criteria.service_type.as_deref())
        .bind(like_pattern(criteria.insurance.as_deref()))
        .bind(criteria.medi_cal_only)
        .fetch_all(pool)
        .await?;
        Ok(centers)
    }

    pub async fn create(id: Uuid, input: &AbaCenterInput, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO aba_centers (
                id, name, street, city, zip, phone, service_type,
                waitlist_availability, waitlist_notes, dx_verification,
                insurance_accepted, medi_cal_plans, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.zip)
        .bind(&input.phone)
        .bind(&input.service_type)
        .bind(&input.waitlist_availability)
        .bind(&input.waitlist_notes)
        .bind(&input.dx_verification)
        .bind(&input.insurance_accepted)
        .bind(&input.medi_cal_plans)
        .bind(&input.notes)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Replace every field; `None` when the id does not exist
    pub async fn update(id: Uuid, input: &AbaCenterInput, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE aba_centers SET
                name = $2,
                street = $3,
                city = $4,
                zip = $5,
                phone = $6,
                service_type = $7,
                waitlist_availability = $8,
                waitlist_notes = $9,
                dx_verification = $10,
                insurance_accepted = $11,
                medi_cal_plans = $12,
                notes = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.zip)
        .bind(&input.phone)
        .bind(&input.service_type)
        .bind(&input.waitlist_availability)
        .bind(&input.waitlist_notes)
        .bind(&input.dx_verification)
        .bind(&input.insurance_accepted)
        .bind(&input.medi_cal_plans)
        .bind(&input.notes)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM aba_centers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AbaCenterInput {
        AbaCenterInput {
            name: " Bright Steps ABA ".to_string(),
            street: "100 Colorado Blvd".to_string(),
            city: "Pasadena".to_string(),
            zip: "91101".to_string(),
            phone: "(626) 555-0100".to_string(),
            service_type: "In-Home".to_string(),
            insurance_accepted: Some("Anthem, Blue Shield".to_string()),
            ..Default::default()
        }
    }

    fn center(input: AbaCenterInput) -> AbaCenter {
        AbaCenter::from_input(Uuid::new_v4(), input.normalized().unwrap(), Utc::now())
    }

    #[test]
    fn test_normalized_trims_required_fields() {
        let input = input().normalized().unwrap();
        assert_eq!(input.name, "Bright Steps ABA");
    }

    #[test]
    fn test_blank_required_field_is_named() {
        let mut input = input();
        input.service_type = "   ".to_string();
        assert_eq!(
            input.normalized().unwrap_err().to_string(),
            "serviceType is required"
        );
    }

    #[test]
    fn test_json_is_camel_case() {
        let json = serde_json::to_value(center(input())).unwrap();
        assert_eq!(json["serviceType"], "In-Home");
        assert_eq!(json["insuranceAccepted"], "Anthem, Blue Shield");
        assert!(json.get("service_type").is_none());
    }

    #[test]
    fn test_search_criteria_compose() {
        let center = center(input());

        let criteria = AbaCenterSearch {
            city: Some("pasa".to_string()),
            insurance: Some("blue shield".to_string()),
            ..Default::default()
        };
        assert!(criteria.matches(&center));

        let criteria = AbaCenterSearch {
            service_type: Some("in-home".to_string()),
            ..Default::default()
        };
        assert!(!criteria.matches(&center), "service type is exact");
    }

    #[test]
    fn test_medi_cal_requires_a_listed_plan() {
        let mut with_plan = input();
        with_plan.medi_cal_plans = Some("L.A. Care".to_string());
        let mut blank_plan = input();
        blank_plan.medi_cal_plans = Some("  ".to_string());

        let criteria = AbaCenterSearch {
            medi_cal_only: true,
            ..Default::default()
        };
        assert!(criteria.matches(&center(with_plan)));
        assert!(!criteria.matches(&center(blank_plan)));
        assert!(!criteria.matches(&center(input())));
    }
}
