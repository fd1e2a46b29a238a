//! Providers domain - service providers listed by coverage area and
//! searchable by proximity

pub mod models;
pub mod store;

pub use models::{NearbyProvider, Provider, ProviderView};
pub use store::{PgProviderStore, ProviderStore};
