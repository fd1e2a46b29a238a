//! Resources domain - providers and services searchable by proximity
//! and diagnosis

pub mod models;
pub mod store;

pub use models::{NearbyResource, Resource, ResourceInput, ResourceValidationError};
pub use store::{PgResourceStore, ResourceStore};
