//! Domain records and the JSON bodies exchanged by the nodeinit services

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::address::OrgAddress;
use crate::node_id::NodeId;
use crate::{Error, Result};

// ============================================================================
// Domain records
// ============================================================================

/// Organization with its credential and registered address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub name: String,
    pub certificate: Vec<u8>,
    pub ip: OrgAddress,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Owner assignment for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMapping {
    pub node: NodeId,
    pub org: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Everything a node needs to connect to its owning organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCredentials {
    pub node: NodeId,
    pub org: String,
    pub certificate: Vec<u8>,
    pub ip: OrgAddress,
}

// ============================================================================
// Certificate encoding
// ============================================================================

pub fn encode_certificate(cert: &[u8]) -> String {
    STANDARD.encode(cert)
}

/// Decode a base64 certificate from the wire; empty certificates are rejected
pub fn decode_certificate(encoded: &str) -> Result<Vec<u8>> {
    let cert = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::InvalidCertificate(format!("certificate is not valid base64: {}", e)))?;
    if cert.is_empty() {
        return Err(Error::InvalidCertificate("certificate is empty".to_string()));
    }
    Ok(cert)
}

// ============================================================================
// Lookup API bodies
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertOrgRequest {
    /// Base64-encoded certificate
    pub certificate: String,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgResponse {
    pub org: String,
    pub certificate: String,
    pub ip: String,
}

impl From<&Organization> for OrgResponse {
    fn from(org: &Organization) -> Self {
        Self {
            org: org.name.clone(),
            certificate: encode_certificate(&org.certificate),
            ip: org.ip.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgListResponse {
    pub orgs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMappingResponse {
    pub node: String,
    pub org: String,
}

impl From<&NodeMapping> for NodeMappingResponse {
    fn from(mapping: &NodeMapping) -> Self {
        Self {
            node: mapping.node.to_string(),
            org: mapping.org.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCredentialsResponse {
    pub node: String,
    pub org: String,
    pub ip: String,
    pub certificate: String,
}

impl From<&NodeCredentials> for NodeCredentialsResponse {
    fn from(creds: &NodeCredentials) -> Self {
        Self {
            node: creds.node.to_string(),
            org: creds.org.clone(),
            ip: creds.ip.to_string(),
            certificate: encode_certificate(&creds.certificate),
        }
    }
}

impl TryFrom<NodeCredentialsResponse> for NodeCredentials {
    type Error = Error;

    fn try_from(resp: NodeCredentialsResponse) -> Result<Self> {
        Ok(Self {
            node: NodeId::canonicalize(&resp.node)?,
            org: resp.org,
            certificate: decode_certificate(&resp.certificate)?,
            ip: OrgAddress::parse(&resp.ip)?,
        })
    }
}

// ============================================================================
// Bootstrap API bodies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapResponse {
    pub organization: String,
    pub certificate: String,
    pub ip: String,
}

impl From<&NodeCredentials> for BootstrapResponse {
    fn from(creds: &NodeCredentials) -> Self {
        Self {
            organization: creds.org.clone(),
            certificate: encode_certificate(&creds.certificate),
            ip: creds.ip.to_string(),
        }
    }
}

/// Error body returned by both services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}
