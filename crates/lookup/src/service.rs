//! Lookup service: the authority on which organization owns a node

use nodeinit_common::{
    validate_org_name, Error, NodeCredentials, NodeId, NodeMapping, OrgAddress, Organization, Result,
};
use tracing::{info, warn};

use crate::store::{CredentialStore, MappingStore, Resolution};

pub struct LookupService<S> {
    store: S,
}

impl<S> LookupService<S>
where
    S: MappingStore + CredentialStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create or replace an organization's certificate and address.
    ///
    /// All input is validated before the store is touched.
    pub fn upsert_organization(&self, name: &str, certificate: &[u8], ip: &str) -> Result<Organization> {
        let name = validate_org_name(name)?;
        if certificate.is_empty() {
            return Err(Error::InvalidCertificate("certificate is empty".to_string()));
        }
        let ip = OrgAddress::parse(ip)?;

        info!("Upserting organization {} with address {}", name, ip);
        self.store.upsert_organization(&name, certificate, &ip)
    }

    pub fn get_organization(&self, name: &str) -> Result<Organization> {
        let name = known_org_name(name)?;
        self.store
            .get_organization(&name)?
            .ok_or(Error::OrgNotFound { name })
    }

    pub fn list_organizations(&self) -> Result<Vec<String>> {
        self.store.list_organizations()
    }

    /// Assign `node` to `org_name`, replacing any previous owner.
    pub fn add_or_update_mapping(&self, node: &NodeId, org_name: &str) -> Result<NodeMapping> {
        let name = known_org_name(org_name)?;
        info!("Mapping node {} to org {}", node, name);

        self.store
            .upsert_mapping(node, &name)?
            .ok_or(Error::OrgNotFound { name })
    }

    /// Credentials of the organization that owns `node`
    pub fn resolve_node(&self, node: &NodeId) -> Result<NodeCredentials> {
        match self.store.resolve(node)? {
            Resolution::Found(creds) => Ok(creds),
            Resolution::Unmapped => Err(Error::MappingNotFound {
                node: node.to_string(),
            }),
            Resolution::DanglingOrg { org } => {
                warn!("Node {} is mapped to missing org {}", node, org);
                Err(Error::OrgNotFound { name: org })
            }
        }
    }

    /// Like [`resolve_node`](Self::resolve_node), but only succeeds when the
    /// node belongs to `org_name`.
    pub fn get_node_for_org(&self, org_name: &str, node: &NodeId) -> Result<NodeCredentials> {
        let org = self.get_organization(org_name)?;
        let creds = self.resolve_node(node)?;
        if creds.org != org.name {
            return Err(Error::MappingNotFound {
                node: node.to_string(),
            });
        }
        Ok(creds)
    }
}

/// Names that fail the grammar can never have been stored.
fn known_org_name(name: &str) -> Result<String> {
    validate_org_name(name).map_err(|_| Error::OrgNotFound {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use nodeinit_common::Database;

    fn test_service() -> LookupService<SqliteStore> {
        let store = SqliteStore::new(Database::open_memory().unwrap()).unwrap();
        LookupService::new(store)
    }

    fn node() -> NodeId {
        NodeId::canonicalize("UK-AA0001-HNODE-A1-0001").unwrap()
    }

    #[test]
    fn test_upsert_and_resolve() {
        let svc = test_service();
        svc.upsert_organization("Acme", b"C", "10.0.0.5").unwrap();
        svc.add_or_update_mapping(&node(), "ACME").unwrap();

        let creds = svc.resolve_node(&node()).unwrap();
        assert_eq!(creds.org, "acme");
        assert_eq!(creds.certificate, b"C");
        assert_eq!(creds.ip.to_string(), "10.0.0.5");
    }

    #[test]
    fn test_invalid_input_rejected() {
        let svc = test_service();
        assert!(matches!(
            svc.upsert_organization("acme_corp", b"C", "10.0.0.5"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            svc.upsert_organization("acme", b"", "10.0.0.5"),
            Err(Error::InvalidCertificate(_))
        ));
        assert!(matches!(
            svc.upsert_organization("acme", b"C", "10.0.0.999"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(svc.list_organizations().unwrap().is_empty());
    }

    #[test]
    fn test_bad_address_leaves_prior_record() {
        let svc = test_service();
        svc.upsert_organization("acme", b"C", "10.0.0.5").unwrap();

        let result = svc.upsert_organization("acme", b"D", "not-an-ip");
        assert!(matches!(result, Err(Error::InvalidAddress(_))));

        let org = svc.get_organization("acme").unwrap();
        assert_eq!(org.certificate, b"C");
        assert_eq!(org.ip.to_string(), "10.0.0.5");
    }

    #[test]
    fn test_mapping_requires_org() {
        let svc = test_service();
        assert!(matches!(
            svc.add_or_update_mapping(&node(), "ghost"),
            Err(Error::OrgNotFound { .. })
        ));
        assert!(matches!(
            svc.add_or_update_mapping(&node(), "not a name"),
            Err(Error::OrgNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_not_found_variants() {
        let svc = test_service();
        assert!(matches!(svc.resolve_node(&node()), Err(Error::MappingNotFound { .. })));

        svc.upsert_organization("acme", b"C", "10.0.0.5").unwrap();
        svc.add_or_update_mapping(&node(), "acme").unwrap();
        svc.store()
            .database()
            .connection()
            .lock()
            .execute("DELETE FROM orgs", [])
            .unwrap();
        assert!(matches!(
            svc.resolve_node(&node()),
            Err(Error::OrgNotFound { name }) if name == "acme"
        ));
    }

    #[test]
    fn test_get_node_for_org_checks_owner() {
        let svc = test_service();
        svc.upsert_organization("acme", b"C", "10.0.0.5").unwrap();
        svc.upsert_organization("globex", b"G", "10.0.0.6").unwrap();
        svc.add_or_update_mapping(&node(), "acme").unwrap();

        assert_eq!(svc.get_node_for_org("acme", &node()).unwrap().org, "acme");
        assert!(matches!(
            svc.get_node_for_org("globex", &node()),
            Err(Error::MappingNotFound { .. })
        ));
        assert!(matches!(
            svc.get_node_for_org("initech", &node()),
            Err(Error::OrgNotFound { .. })
        ));
    }
}
