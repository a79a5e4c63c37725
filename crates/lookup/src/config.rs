//! Lookup service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lookup service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// HTTP listen address
    pub listen: String,

    /// SQLite database holding orgs and node mappings
    pub db_path: PathBuf,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8081".to_string(),
            db_path: nodeinit_common::default_db_path(),
        }
    }
}

impl LookupConfig {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LookupConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.listen, "127.0.0.1:8081");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.toml");
        std::fs::write(&path, "db_path = \"/var/lib/nodeinit/lookup.db\"\n").unwrap();

        let config = LookupConfig::load(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/nodeinit/lookup.db"));
        assert_eq!(config.listen, "127.0.0.1:8081");
    }
}
