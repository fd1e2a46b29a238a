//! Users domain - read-only account lookups for protected routes

pub mod models;
pub mod store;

pub use models::{User, UserProfile};
pub use store::{PgUserStore, UserStore};
