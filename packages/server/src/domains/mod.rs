// Business domains
pub mod aba_centers;
pub mod auth;
pub mod locations;
pub mod providers;
pub mod regional_centers;
pub mod resources;
pub mod search;
pub mod users;
