//! ABA centers domain - therapy centers searchable by city, service type
//! and insurance

pub mod models;
pub mod store;

pub use models::{AbaCenter, AbaCenterInput, AbaCenterSearch, AbaCenterValidationError};
pub use store::{AbaCenterStore, PgAbaCenterStore};
