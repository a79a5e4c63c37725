//! nodeinit lookup service
//!
//! Owns the node to organization mapping and each organization's
//! certificate and address, and serves them over HTTP.

pub mod config;
pub mod routes;
pub mod service;
pub mod store;

pub use config::LookupConfig;
pub use routes::{lookup_router, LOOKING_FOR_CREDENTIALS};
pub use service::LookupService;
pub use store::{CredentialStore, MappingStore, Resolution, SqliteStore};
