pub mod aba_center;

pub use aba_center::{AbaCenter, AbaCenterInput, AbaCenterSearch, AbaCenterValidationError};
