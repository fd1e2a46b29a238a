// Common test utilities
#![allow(dead_code)]

pub mod database;
pub mod fixtures;
pub mod harness;

pub use database::*;
pub use fixtures::*;
pub use harness::*;
