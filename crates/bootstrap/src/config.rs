//! Bootstrap service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::mfg_status::MfgStatus;

/// Bootstrap service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// HTTP listen address
    pub listen: String,

    /// Budget shared by the validation and lookup calls of one request
    pub request_timeout_ms: u64,

    /// Node manufacturing registry
    pub nmr: NmrConfig,

    /// Lookup service
    pub lookup: LookupTarget,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            request_timeout_ms: 10_000,
            nmr: NmrConfig::default(),
            lookup: LookupTarget::default(),
        }
    }
}

/// Node manufacturing registry client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NmrConfig {
    /// Base URL of the registry, e.g. `http://nmr.factory:8080`
    pub base_url: String,

    /// Per-call HTTP timeout
    pub timeout_ms: u64,

    /// The only lifecycle state that makes a node eligible for bootstrap
    pub ready_status: MfgStatus,
}

impl Default for NmrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8085".to_string(),
            timeout_ms: 5_000,
            ready_status: MfgStatus::NodeInTransit,
        }
    }
}

impl NmrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Where node credentials are resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupTarget {
    /// Base URL of a remote lookup service
    pub base_url: String,

    /// Per-call HTTP timeout
    pub timeout_ms: u64,

    /// Open this lookup database in-process instead of calling `base_url`
    pub embedded_db: Option<PathBuf>,
}

impl Default for LookupTarget {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            timeout_ms: 5_000,
            embedded_db: None,
        }
    }
}

impl LookupTarget {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl BootstrapConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
