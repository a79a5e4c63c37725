//! Validation against the node manufacturing registry (NMR)

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use nodeinit_common::NodeId;

use crate::config::NmrConfig;
use crate::mfg_status::MfgStatus;

/// `looking_for` value sent on NMR status queries
pub const LOOKING_FOR_STATUS: &str = "status_info";

/// Outcome of a completed validation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Node is in the ready state
    Accepted { status: MfgStatus },
    /// Node is known but not ready for bootstrap
    Rejected { status: MfgStatus },
}

/// Validation could not be completed
#[derive(Error, Debug)]
pub enum ValidationFault {
    #[error("NMR request failed: {0}")]
    Transport(String),

    #[error("NMR did not answer within {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("NMR returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("NMR response could not be decoded: {0}")]
    Decode(String),

    #[error("NMR reported unknown status '{0}'")]
    UnknownStatus(String),
}

/// Checks whether a node may be bootstrapped
#[async_trait]
pub trait NodeValidator: Send + Sync {
    async fn validate_node(&self, node: &NodeId) -> Result<Validation, ValidationFault>;
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

/// HTTP client for the NMR status endpoint
pub struct NmrClient {
    base_url: String,
    ready_status: MfgStatus,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl NmrClient {
    pub fn new(config: &NmrConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ready_status: config.ready_status,
            timeout: config.timeout(),
            http_client,
        })
    }

    fn request_error(&self, e: reqwest::Error) -> ValidationFault {
        if e.is_timeout() {
            ValidationFault::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }
        } else {
            ValidationFault::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl NodeValidator for NmrClient {
    async fn validate_node(&self, node: &NodeId) -> Result<Validation, ValidationFault> {
        let url = format!("{}/node/status", self.base_url);
        let resp = self
            .http_client
            .get(&url)
            .query(&[("node", node.as_str()), ("looking_for", LOOKING_FOR_STATUS)])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("NMR status query for {} returned HTTP {}: {}", node, status, body);
            return Err(ValidationFault::HttpStatus {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.request_error(e))?;
        let body: StatusBody =
            serde_json::from_slice(&bytes).map_err(|e| ValidationFault::Decode(e.to_string()))?;

        let reported: MfgStatus = body
            .status
            .parse()
            .map_err(|_| ValidationFault::UnknownStatus(body.status.clone()))?;
        debug!("NMR reports node {} as '{}'", node, reported);

        if reported == self.ready_status {
            Ok(Validation::Accepted { status: reported })
        } else {
            Ok(Validation::Rejected { status: reported })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn node() -> NodeId {
        NodeId::canonicalize("UK-AA0001-HNODE-A1-0001").unwrap()
    }

    fn client(server: &MockServer, timeout_ms: u64) -> NmrClient {
        NmrClient::new(&NmrConfig {
            base_url: server.uri(),
            timeout_ms,
            ready_status: MfgStatus::NodeInTransit,
        })
        .unwrap()
    }

    async fn nmr_reporting(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/node/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_ready_status_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/node/status"))
            .and(query_param("node", "uk-aa0001-hnode-a1-0001"))
            .and(query_param("looking_for", "status_info"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "node in transit to org" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server, 1000).validate_node(&node()).await.unwrap();
        assert_eq!(
            outcome,
            Validation::Accepted {
                status: MfgStatus::NodeInTransit
            }
        );
    }

    #[tokio::test]
    async fn test_symbolic_status_is_understood() {
        let server = nmr_reporting(serde_json::json!({ "status": "StatusNodeIntransit" })).await;
        let outcome = client(&server, 1000).validate_node(&node()).await.unwrap();
        assert!(matches!(outcome, Validation::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_other_known_status_is_rejected() {
        let server = nmr_reporting(serde_json::json!({ "status": "production test completed" })).await;
        let outcome = client(&server, 1000).validate_node(&node()).await.unwrap();
        assert_eq!(
            outcome,
            Validation::Rejected {
                status: MfgStatus::ProductionTestCompleted
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_status_is_fault() {
        let server = nmr_reporting(serde_json::json!({ "status": "lost at sea" })).await;
        let err = client(&server, 1000).validate_node(&node()).await.unwrap_err();
        assert!(matches!(err, ValidationFault::UnknownStatus(s) if s == "lost at sea"));
    }

    #[tokio::test]
    async fn test_garbage_body_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server, 1000).validate_node(&node()).await.unwrap_err();
        assert!(matches!(err, ValidationFault::Decode(_)));
    }

    #[tokio::test]
    async fn test_http_error_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
            .mount(&server)
            .await;

        let err = client(&server, 1000).validate_node(&node()).await.unwrap_err();
        assert!(matches!(err, ValidationFault::HttpStatus { status: 500 }));
        assert!(!err.to_string().contains("database down"));
    }

    #[tokio::test]
    async fn test_slow_registry_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "node in transit to org" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client(&server, 50).validate_node(&node()).await.unwrap_err();
        assert!(matches!(err, ValidationFault::Timeout { after_ms: 50 }));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_fault() {
        let client = NmrClient::new(&NmrConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 1000,
            ready_status: MfgStatus::NodeInTransit,
        })
        .unwrap();
        let err = client.validate_node(&node()).await.unwrap_err();
        assert!(matches!(err, ValidationFault::Transport(_)));
    }
}
