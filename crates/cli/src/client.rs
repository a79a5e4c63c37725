//! HTTP client for the lookup and bootstrap services

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

use nodeinit_common::{
    encode_certificate, BootstrapResponse, ErrorBody, NodeCredentialsResponse, NodeId,
    NodeMappingResponse, OrgListResponse, OrgResponse, UpsertOrgRequest,
};

/// Client for the nodeinit services
pub struct ApiClient {
    lookup_addr: String,
    bootstrap_addr: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn new(lookup_addr: &str, bootstrap_addr: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            lookup_addr: lookup_addr.trim_end_matches('/').to_string(),
            bootstrap_addr: bootstrap_addr.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn lookup_addr(&self) -> &str {
        &self.lookup_addr
    }

    pub fn bootstrap_addr(&self) -> &str {
        &self.bootstrap_addr
    }

    // Organization operations

    /// Create or replace an organization's certificate and address
    pub async fn upsert_org(&self, name: &str, certificate: &[u8], ip: &str) -> Result<OrgResponse> {
        let body = UpsertOrgRequest {
            certificate: encode_certificate(certificate),
            ip: ip.to_string(),
        };
        let resp = self
            .http_client
            .post(format!("{}/orgs/{}", self.lookup_addr, name))
            .json(&body)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn get_org(&self, name: &str) -> Result<OrgResponse> {
        let resp = self
            .http_client
            .get(format!("{}/orgs/{}", self.lookup_addr, name))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn list_orgs(&self) -> Result<Vec<String>> {
        let resp = self
            .http_client
            .get(format!("{}/orgs", self.lookup_addr))
            .send()
            .await?;
        let list: OrgListResponse = decode(resp).await?;
        Ok(list.orgs)
    }

    // Node operations

    /// Assign a node to an organization
    pub async fn map_node(&self, node: &NodeId, org: &str) -> Result<NodeMappingResponse> {
        let resp = self
            .http_client
            .post(format!("{}/orgs/{}/devices/{}", self.lookup_addr, org, node))
            .send()
            .await?;
        decode(resp).await
    }

    /// Credentials of the organization owning `node`, optionally checking the owner
    pub async fn get_node(&self, node: &NodeId, org: Option<&str>) -> Result<NodeCredentialsResponse> {
        let request = match org {
            Some(org) => self
                .http_client
                .get(format!("{}/orgs/{}/devices/{}", self.lookup_addr, org, node)),
            None => self
                .http_client
                .get(format!("{}/orgs/node", self.lookup_addr))
                .query(&[("node", node.as_str()), ("looking_for", "org_credentials")]),
        };
        decode(request.send().await?).await
    }

    /// Run the bootstrap protocol as a node would
    pub async fn bootstrap(&self, node: &str) -> Result<BootstrapResponse> {
        let resp = self
            .http_client
            .get(format!("{}/", self.bootstrap_addr))
            .query(&[("node", node), ("looking_for", "validation")])
            .send()
            .await?;
        decode(resp).await
    }

    /// Whether the service at `base` answers its ping endpoint
    pub async fn ping(&self, base: &str) -> bool {
        match self.http_client.get(format!("{}/ping", base)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody { error, state: Some(state) }) => Err(anyhow!("{} ({}): {}", status, state, error)),
        Ok(ErrorBody { error, state: None }) => Err(anyhow!("{}: {}", status, error)),
        Err(_) => Err(anyhow!("{}: {}", status, text)),
    }
}
