//! Node to credential resolution
//!
//! The orchestrator resolves validated nodes through [`NodeResolver`], which
//! is backed either by a remote lookup service ([`LookupClient`]) or by an
//! in-process [`LookupService`] shared through an `Arc`.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use nodeinit_common::{NodeCredentials, NodeCredentialsResponse, NodeId};
use nodeinit_lookup::routes::LOOKING_FOR_CREDENTIALS;
use nodeinit_lookup::{CredentialStore, LookupService, MappingStore};

use crate::config::LookupTarget;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// No mapping for the node, or its organization is gone
    #[error("not found: {0}")]
    NotFound(String),

    #[error("lookup failed: {0}")]
    Fault(String),
}

/// Resolves a node to the credentials of its owning organization
#[async_trait]
pub trait NodeResolver: Send + Sync {
    async fn resolve(&self, node: &NodeId) -> Result<NodeCredentials, ResolveError>;
}

/// In-process resolution; the store query runs on the blocking pool.
#[async_trait]
impl<S> NodeResolver for Arc<LookupService<S>>
where
    S: MappingStore + CredentialStore + 'static,
{
    async fn resolve(&self, node: &NodeId) -> Result<NodeCredentials, ResolveError> {
        let service = Arc::clone(self);
        let node = node.clone();
        let resolved = tokio::task::spawn_blocking(move || service.resolve_node(&node))
            .await
            .map_err(|e| ResolveError::Fault(format!("lookup task failed: {}", e)))?;

        resolved.map_err(|e| {
            if e.is_not_found() {
                ResolveError::NotFound(e.to_string())
            } else {
                ResolveError::Fault(e.to_string())
            }
        })
    }
}

/// HTTP client for the lookup API
pub struct LookupClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl LookupClient {
    pub fn new(target: &LookupTarget) -> Result<Self, reqwest::Error> {
        Self::with_timeout(&target.base_url, target.timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl NodeResolver for LookupClient {
    async fn resolve(&self, node: &NodeId) -> Result<NodeCredentials, ResolveError> {
        let url = format!("{}/orgs/node", self.base_url);
        let resp = self
            .http_client
            .get(&url)
            .query(&[("node", node.as_str()), ("looking_for", LOOKING_FOR_CREDENTIALS)])
            .send()
            .await
            .map_err(|e| ResolveError::Fault(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                let body = resp.text().await.unwrap_or_default();
                Err(ResolveError::NotFound(body))
            }
            status if status.is_success() => {
                let body: NodeCredentialsResponse = resp
                    .json()
                    .await
                    .map_err(|e| ResolveError::Fault(format!("bad lookup response: {}", e)))?;
                NodeCredentials::try_from(body)
                    .map_err(|e| ResolveError::Fault(format!("bad lookup response: {}", e)))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(ResolveError::Fault(format!("lookup returned HTTP {}: {}", status, body)))
            }
        }
    }
}
