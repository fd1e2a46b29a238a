// HTTP routes
pub mod aba_centers;
pub mod health;
pub mod providers;
pub mod regional_centers;
pub mod resources;
pub mod users;

pub use aba_centers::*;
pub use health::*;
pub use providers::*;
pub use regional_centers::*;
pub use resources::*;
pub use users::*;

use axum::http::HeaderName;

/// Total matches before pagination on endpoints that return a bare array
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");
