//! Lookup database schema and operations
//!
//! Tables:
//! - orgs: organization name, certificate and registered address
//! - node_mappings: canonical node id to owning organization
//!
//! Every write is a single `INSERT ... ON CONFLICT DO UPDATE` statement, so
//! concurrent writers for the same key never produce duplicate rows.

use nodeinit_common::{Database, NodeCredentials, NodeId, NodeMapping, OrgAddress, Organization, Result};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

// ============================================================================
// Capability traits
// ============================================================================

/// Per-organization credential record
pub trait CredentialStore: Send + Sync {
    /// Create or replace the certificate and address of `name` together.
    fn upsert_organization(&self, name: &str, certificate: &[u8], ip: &OrgAddress) -> Result<Organization>;

    fn get_organization(&self, name: &str) -> Result<Option<Organization>>;

    /// All organization names in ascending order
    fn list_organizations(&self) -> Result<Vec<String>>;
}

/// Outcome of joining a node mapping to its organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(NodeCredentials),
    Unmapped,
    /// The mapping names an organization that no longer exists
    DanglingOrg { org: String },
}

/// Node to organization ownership
pub trait MappingStore: Send + Sync {
    /// Point `node` at `org_name`, overwriting any previous owner.
    ///
    /// Returns `None` without writing when the organization does not exist.
    fn upsert_mapping(&self, node: &NodeId, org_name: &str) -> Result<Option<NodeMapping>>;

    fn resolve(&self, node: &NodeId) -> Result<Resolution>;
}

// ============================================================================
// SQLite implementation
// ============================================================================

/// Lookup store backed by the shared SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Wrap `db` and create the lookup tables if they are missing
    pub fn new(db: Database) -> Result<Self> {
        let store = Self { db };
        store.init_schema()?;
        Ok(store)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.db.connection();
        let conn = conn.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS orgs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                certificate BLOB NOT NULL,
                ip TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- node_id holds the canonical lowercase form only
            CREATE TABLE IF NOT EXISTS node_mappings (
                node_id TEXT PRIMARY KEY,
                org_name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_node_mappings_org ON node_mappings(org_name);
            "#,
        )?;

        info!("Lookup database schema initialized");
        Ok(())
    }
}

fn now_epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn address_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<OrgAddress> {
    let raw: String = row.get(idx)?;
    OrgAddress::parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn node_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NodeId> {
    let raw: String = row.get(idx)?;
    NodeId::canonicalize(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn org_from_row(row: &Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        name: row.get(0)?,
        certificate: row.get(1)?,
        ip: address_column(row, 2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn mapping_from_row(row: &Row<'_>) -> rusqlite::Result<NodeMapping> {
    Ok(NodeMapping {
        node: node_column(row, 0)?,
        org: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

impl CredentialStore for SqliteStore {
    fn upsert_organization(&self, name: &str, certificate: &[u8], ip: &OrgAddress) -> Result<Organization> {
        let now = now_epoch_secs();
        let conn = self.db.connection();
        let conn = conn.lock();
        let org = conn.query_row(
            "INSERT INTO orgs (name, certificate, ip, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(name) DO UPDATE SET
                certificate = excluded.certificate,
                ip = excluded.ip,
                updated_at = excluded.updated_at
             RETURNING name, certificate, ip, created_at, updated_at",
            params![name, certificate, ip.to_string(), now],
            org_from_row,
        )?;
        Ok(org)
    }

    fn get_organization(&self, name: &str) -> Result<Option<Organization>> {
        let conn = self.db.connection();
        let conn = conn.lock();
        let org = conn
            .query_row(
                "SELECT name, certificate, ip, created_at, updated_at FROM orgs WHERE name = ?1",
                params![name],
                org_from_row,
            )
            .optional()?;
        Ok(org)
    }

    fn list_organizations(&self) -> Result<Vec<String>> {
        let conn = self.db.connection();
        let conn = conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM orgs ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }
}

impl MappingStore for SqliteStore {
    fn upsert_mapping(&self, node: &NodeId, org_name: &str) -> Result<Option<NodeMapping>> {
        let now = now_epoch_secs();
        let conn = self.db.connection();
        let conn = conn.lock();
        // The SELECT yields no row for an unknown org, so nothing is written.
        let mapping = conn
            .query_row(
                "INSERT INTO node_mappings (node_id, org_name, created_at, updated_at)
                 SELECT ?1, name, ?3, ?3 FROM orgs WHERE name = ?2
                 ON CONFLICT(node_id) DO UPDATE SET
                    org_name = excluded.org_name,
                    updated_at = excluded.updated_at
                 RETURNING node_id, org_name, created_at, updated_at",
                params![node.as_str(), org_name, now],
                mapping_from_row,
            )
            .optional()?;
        Ok(mapping)
    }

    fn resolve(&self, node: &NodeId) -> Result<Resolution> {
        let conn = self.db.connection();
        let conn = conn.lock();
        let row = conn
            .query_row(
                "SELECT m.org_name, o.certificate, o.ip
                 FROM node_mappings m
                 LEFT JOIN orgs o ON o.name = m.org_name
                 WHERE m.node_id = ?1",
                params![node.as_str()],
                |row| {
                    let org: String = row.get(0)?;
                    let certificate: Option<Vec<u8>> = row.get(1)?;
                    let ip = match row.get::<_, Option<String>>(2)? {
                        Some(_) => Some(address_column(row, 2)?),
                        None => None,
                    };
                    Ok((org, certificate, ip))
                },
            )
            .optional()?;

        Ok(match row {
            None => Resolution::Unmapped,
            Some((org, Some(certificate), Some(ip))) => Resolution::Found(NodeCredentials {
                node: node.clone(),
                org,
                certificate,
                ip,
            }),
            Some((org, _, _)) => Resolution::DanglingOrg { org },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_store() -> SqliteStore {
        SqliteStore::new(Database::open_memory().unwrap()).unwrap()
    }

    fn node(raw: &str) -> NodeId {
        NodeId::canonicalize(raw).unwrap()
    }

    fn mapping_rows(store: &SqliteStore) -> i64 {
        store
            .database()
            .connection()
            .lock()
            .query_row("SELECT COUNT(*) FROM node_mappings", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_org_upsert_replaces_certificate_and_address() {
        let store = test_store();
        let first = store
            .upsert_organization("acme", b"old", &OrgAddress::parse("10.0.0.5").unwrap())
            .unwrap();
        let second = store
            .upsert_organization("acme", b"new", &OrgAddress::parse("10.1.0.0/16").unwrap())
            .unwrap();

        assert_eq!(second.certificate, b"new");
        assert_eq!(second.ip.to_string(), "10.1.0.0/16");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.list_organizations().unwrap(), vec!["acme".to_string()]);
    }

    #[test]
    fn test_list_orgs_sorted() {
        let store = test_store();
        let ip = OrgAddress::parse("10.0.0.1").unwrap();
        for name in ["zeta", "acme", "mid"] {
            store.upsert_organization(name, b"c", &ip).unwrap();
        }
        assert_eq!(store.list_organizations().unwrap(), vec!["acme", "mid", "zeta"]);
        assert!(store.get_organization("nope").unwrap().is_none());
    }

    #[test]
    fn test_mapping_upsert_is_idempotent() {
        let store = test_store();
        store
            .upsert_organization("acme", b"c", &OrgAddress::parse("10.0.0.5").unwrap())
            .unwrap();
        let id = node("uk-aa0001-hnode-a1-0001");

        store.upsert_mapping(&id, "acme").unwrap().unwrap();
        store.upsert_mapping(&id, "acme").unwrap().unwrap();
        assert_eq!(mapping_rows(&store), 1);
    }

    #[test]
    fn test_mapping_upsert_overwrites_owner() {
        let store = test_store();
        let ip = OrgAddress::parse("10.0.0.5").unwrap();
        store.upsert_organization("acme", b"c1", &ip).unwrap();
        store.upsert_organization("globex", b"c2", &ip).unwrap();
        let id = node("uk-aa0001-hnode-a1-0001");

        store.upsert_mapping(&id, "acme").unwrap().unwrap();
        let moved = store.upsert_mapping(&id, "globex").unwrap().unwrap();

        assert_eq!(moved.org, "globex");
        assert_eq!(mapping_rows(&store), 1);
        assert!(matches!(store.resolve(&id).unwrap(), Resolution::Found(c) if c.org == "globex"));
    }

    #[test]
    fn test_mapping_to_unknown_org_writes_nothing() {
        let store = test_store();
        let id = node("uk-aa0001-hnode-a1-0001");
        assert!(store.upsert_mapping(&id, "ghost").unwrap().is_none());
        assert_eq!(mapping_rows(&store), 0);
    }

    #[test]
    fn test_resolve_outcomes() {
        let store = test_store();
        let id = node("uk-aa0001-hnode-a1-0001");
        assert_eq!(store.resolve(&id).unwrap(), Resolution::Unmapped);

        store
            .upsert_organization("acme", b"C", &OrgAddress::parse("10.0.0.5").unwrap())
            .unwrap();
        store.upsert_mapping(&id, "acme").unwrap();
        match store.resolve(&id).unwrap() {
            Resolution::Found(creds) => {
                assert_eq!(creds.org, "acme");
                assert_eq!(creds.certificate, b"C");
                assert_eq!(creds.ip.to_string(), "10.0.0.5");
            }
            other => panic!("expected credentials, got {other:?}"),
        }

        store
            .database()
            .connection()
            .lock()
            .execute("DELETE FROM orgs WHERE name = 'acme'", [])
            .unwrap();
        assert_eq!(
            store.resolve(&id).unwrap(),
            Resolution::DanglingOrg { org: "acme".to_string() }
        );
    }

    #[test]
    fn test_concurrent_mapping_upserts_leave_one_row() {
        let store = Arc::new(test_store());
        let ip = OrgAddress::parse("10.0.0.5").unwrap();
        store.upsert_organization("acme", b"c1", &ip).unwrap();
        store.upsert_organization("globex", b"c2", &ip).unwrap();
        let id = node("uk-aa0001-hnode-a1-0001");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let id = id.clone();
                std::thread::spawn(move || {
                    let org = if i % 2 == 0 { "acme" } else { "globex" };
                    store.upsert_mapping(&id, org).unwrap().unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(mapping_rows(&store), 1);
        match store.resolve(&id).unwrap() {
            Resolution::Found(creds) => assert!(creds.org == "acme" || creds.org == "globex"),
            other => panic!("expected a mapped node, got {:?}", other),
        }
    }
}
