//! Infrastructure adapters: storage, HTTP transport and telemetry.

pub mod db;
pub mod error;
pub mod http;
pub mod telemetry;
