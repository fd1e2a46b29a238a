use crate::common::pagination::PageRequest;
use crate::domains::locations::{Coordinate, DistanceUnit};

use super::SearchError;

/// Radius used when the caller omits one or sends something unusable
pub const DEFAULT_RADIUS: f64 = 5.0;

/// Attribute filters for directory searches; all present filters must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilters {
    /// Matches records sharing at least one diagnosis (exact tag equality)
    pub diagnoses: Vec<String>,
    pub county: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub office_type: Option<String>,
    /// Provider coverage area, case-insensitive substring
    pub area: Option<String>,
}

impl AttributeFilters {
    /// Parse a comma-separated diagnosis list, dropping blanks and duplicates
    pub fn with_diagnoses_csv(mut self, csv: Option<&str>) -> Self {
        self.diagnoses = parse_diagnoses(csv.unwrap_or_default());
        self
    }

    pub fn with_county(mut self, county: Option<String>) -> Self {
        self.county = non_blank(county);
        self
    }

    pub fn with_district(mut self, district: Option<String>) -> Self {
        self.district = non_blank(district);
        self
    }

    pub fn with_city(mut self, city: Option<String>) -> Self {
        self.city = non_blank(city);
        self
    }

    pub fn with_office_type(mut self, office_type: Option<String>) -> Self {
        self.office_type = non_blank(office_type);
        self
    }

    pub fn with_area(mut self, area: Option<String>) -> Self {
        self.area = non_blank(area);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
            && self.county.is_none()
            && self.district.is_none()
            && self.city.is_none()
            && self.office_type.is_none()
            && self.area.is_none()
    }

    /// True when no diagnosis filter is set or the tags intersect it
    pub fn matches_diagnoses(&self, tags: &[String]) -> bool {
        self.diagnoses.is_empty() || tags.iter().any(|tag| self.diagnoses.contains(tag))
    }
}

/// Case-insensitive substring match; an absent filter always matches
pub fn contains_ignore_case(value: Option<&str>, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(filter) => value
            .map(|v| v.to_lowercase().contains(&filter.to_lowercase()))
            .unwrap_or(false),
    }
}

/// Turn a filter value into an ILIKE substring pattern with wildcards escaped
pub fn like_pattern(value: Option<&str>) -> Option<String> {
    value.map(|v| {
        let escaped = v
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

fn parse_diagnoses(csv: &str) -> Vec<String> {
    let mut diagnoses: Vec<String> = Vec::new();
    for tag in csv.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !diagnoses.iter().any(|d| d == tag) {
            diagnoses.push(tag.to_string());
        }
    }
    diagnoses
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A nearby-search request, built per request and never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Unvalidated origin; the engine rejects it if out of range
    pub origin: Coordinate,
    pub radius: f64,
    pub unit: DistanceUnit,
    pub filters: AttributeFilters,
    /// `None` returns every match
    pub page: Option<PageRequest>,
}

impl SearchQuery {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            origin,
            radius: DEFAULT_RADIUS,
            unit: DistanceUnit::Miles,
            filters: AttributeFilters::default(),
            page: Some(PageRequest::default()),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_filters(mut self, filters: AttributeFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    pub fn without_paging(mut self) -> Self {
        self.page = None;
        self
    }

    /// Radius in the query's unit, with the default (5 miles, converted)
    /// substituted for non-finite or non-positive values
    pub fn effective_radius(&self) -> f64 {
        if self.radius.is_finite() && self.radius > 0.0 {
            self.radius
        } else {
            DistanceUnit::Miles.convert(DEFAULT_RADIUS, self.unit)
        }
    }
}

/// Parse a radius query parameter, substituting `default` when missing,
/// unparsable, non-finite, or non-positive
pub fn parse_radius(raw: Option<&str>, default: f64) -> f64 {
    raw.and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(default)
}

/// Parse a required origin coordinate from `lat`/`lng` query parameters
///
/// Only presence and numeric form are checked here; range validation is the
/// engine's job.
pub fn parse_origin(lat: Option<&str>, lng: Option<&str>) -> Result<Coordinate, SearchError> {
    let latitude = parse_component(lat, "latitude")?;
    let longitude = parse_component(lng, "longitude")?;
    Ok(Coordinate {
        latitude,
        longitude,
    })
}

fn parse_component(raw: Option<&str>, name: &str) -> Result<f64, SearchError> {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .and_then(|r| r.parse::<f64>().ok())
        .ok_or_else(|| SearchError::InvalidParameter(format!("Invalid {} parameter", name)))
}
