//! Regional centers domain - listing, attribute search and nearest-office
//! lookup

pub mod models;
pub mod store;

pub use models::{NearestCenter, RegionalCenter, RegionalCenterSummary};
pub use store::{PgRegionalCenterStore, RegionalCenterStore};
