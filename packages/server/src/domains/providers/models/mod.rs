pub mod provider;

pub use provider::{split_areas, NearbyProvider, Provider, ProviderView};
