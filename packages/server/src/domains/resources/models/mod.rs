//! Resource domain models

pub mod resource;

pub use resource::{NearbyResource, Resource, ResourceInput, ResourceValidationError};
