//! nodeinit Common Library
//!
//! Node identifiers, organization naming and addressing rules, the shared
//! error taxonomy, and the SQLite wrapper used by the lookup store.

pub mod address;
pub mod db;
pub mod error;
pub mod node_id;
pub mod org_name;
pub mod types;

pub use address::{AddressError, OrgAddress};
pub use db::Database;
pub use error::{Error, Result};
pub use node_id::{NodeId, NodeIdError, NodeType};
pub use org_name::{validate_org_name, OrgNameError};
pub use types::*;

/// nodeinit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default data directory
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".nodeinit")
}

/// Default lookup database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("lookup.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
