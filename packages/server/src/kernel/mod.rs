//! Kernel module - server dependencies and their test doubles.

pub mod deps;
pub mod test_dependencies;

pub use deps::ServerDeps;
pub use test_dependencies::{InMemoryStore, TestDependencies, UnavailableStore, TEST_JWT_SECRET};
