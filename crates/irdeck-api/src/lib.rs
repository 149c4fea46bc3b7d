//! irdeck-api: typed HTTP client for the IR hub REST API.
//!
//! Request/response models mirror the hub's wire format, non-2xx
//! responses map into the client-side error taxonomy, and every request
//! optionally carries the `X-API-Key` header from runtime configuration.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::HubClient;
pub use config::HubConfig;
pub use error::{ApiError, ErrorKind};
