pub mod regional_center;

pub use regional_center::{NearestCenter, RegionalCenter, RegionalCenterSummary};
