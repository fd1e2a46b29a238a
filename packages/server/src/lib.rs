// Care Directory - API Core
//
// Backend for a directory of care resources and regional centers, searchable
// by proximity to a caller-supplied point. Domains own their models and
// stores; the server layer wires them into axum routes behind a bearer-token
// permission gate.

pub mod common;
pub mod config;
pub mod data_migrations;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
