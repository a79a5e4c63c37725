//! Bootstrap protocol state machine
//!
//! A run moves linearly through
//! `Received -> Validating -> Validated -> Resolving -> Resolved`
//! or stops in one terminal failure state. Validation always completes
//! before the resolver is called, and nothing is retried.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nodeinit_common::{ErrorBody, NodeCredentials, NodeId, NodeIdError};

use crate::mfg_status::MfgStatus;
use crate::resolver::{NodeResolver, ResolveError};
use crate::validator::{NodeValidator, Validation, ValidationFault};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolState {
    Received,
    Validating,
    Validated,
    Resolving,
    Resolved,
    MalformedIdentifier,
    ValidationRejected,
    ValidationFault,
    LookupNotFound,
    LookupFault,
    Cancelled,
}

impl ProtocolState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validating => "validating",
            Self::Validated => "validated",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::MalformedIdentifier => "malformed_identifier",
            Self::ValidationRejected => "validation_rejected",
            Self::ValidationFault => "validation_fault",
            Self::LookupNotFound => "lookup_not_found",
            Self::LookupFault => "lookup_fault",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered states visited by one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapTrace {
    states: Vec<ProtocolState>,
}

impl BootstrapTrace {
    fn enter(&mut self, state: ProtocolState) {
        debug!("bootstrap state -> {}", state);
        self.states.push(state);
    }

    pub fn states(&self) -> &[ProtocolState] {
        &self.states
    }

    pub fn last(&self) -> Option<ProtocolState> {
        self.states.last().copied()
    }

    pub fn visited(&self, state: ProtocolState) -> bool {
        self.states.contains(&state)
    }
}

/// Terminal failure of a bootstrap run
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Malformed node identifier: {0}")]
    MalformedIdentifier(#[from] NodeIdError),

    #[error("Node {node} is not ready for bootstrap (status '{status}')")]
    ValidationRejected { node: NodeId, status: MfgStatus },

    #[error("Validation of node {node} failed: {fault}")]
    ValidationFault { node: NodeId, fault: ValidationFault },

    #[error("No organization found for node {node}: {reason}")]
    LookupNotFound { node: NodeId, reason: String },

    #[error("Lookup of node {node} failed: {reason}")]
    LookupFault { node: NodeId, reason: String },

    #[error("Bootstrap cancelled while {during}")]
    Cancelled { during: ProtocolState },
}

impl BootstrapError {
    /// Terminal state this error stands for
    pub fn state(&self) -> ProtocolState {
        match self {
            Self::MalformedIdentifier(_) => ProtocolState::MalformedIdentifier,
            Self::ValidationRejected { .. } => ProtocolState::ValidationRejected,
            Self::ValidationFault { .. } => ProtocolState::ValidationFault,
            Self::LookupNotFound { .. } => ProtocolState::LookupNotFound,
            Self::LookupFault { .. } => ProtocolState::LookupFault,
            Self::Cancelled { .. } => ProtocolState::Cancelled,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedIdentifier(_) => StatusCode::BAD_REQUEST,
            Self::ValidationRejected { .. } | Self::LookupNotFound { .. } => {
                StatusCode::NOT_ACCEPTABLE
            }
            Self::ValidationFault { .. } | Self::LookupFault { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Infrastructure failure; the node may retry the whole protocol
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::ValidationFault { .. } | Self::LookupFault { .. } | Self::Cancelled { .. }
        )
    }
}

impl IntoResponse for BootstrapError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            state: Some(self.state().to_string()),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Trace and result of one run
#[derive(Debug)]
pub struct BootstrapOutcome {
    pub trace: BootstrapTrace,
    pub result: Result<NodeCredentials, BootstrapError>,
}

enum Interrupted {
    Cancelled,
    DeadlineExceeded,
}

/// Drives the bootstrap protocol for one node at a time
pub struct Orchestrator {
    validator: Arc<dyn NodeValidator>,
    resolver: Arc<dyn NodeResolver>,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        validator: Arc<dyn NodeValidator>,
        resolver: Arc<dyn NodeResolver>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            resolver,
            request_timeout,
        }
    }

    /// Run the protocol for `raw_id`.
    ///
    /// Both outbound calls share one deadline of `request_timeout`. When
    /// `cancel` fires the in-flight call is dropped and the run stops.
    pub async fn run(&self, raw_id: &str, cancel: &CancellationToken) -> BootstrapOutcome {
        let mut trace = BootstrapTrace::default();
        let result = self.drive(raw_id, cancel, &mut trace).await;

        if let Err(e) = &result {
            trace.enter(e.state());
            if e.is_fault() {
                error!("Bootstrap of '{}' failed: {}", raw_id, e);
            } else {
                info!("Bootstrap of '{}' refused: {}", raw_id, e);
            }
        } else {
            trace.enter(ProtocolState::Resolved);
        }

        BootstrapOutcome { trace, result }
    }

    async fn drive(
        &self,
        raw_id: &str,
        cancel: &CancellationToken,
        trace: &mut BootstrapTrace,
    ) -> Result<NodeCredentials, BootstrapError> {
        let deadline = Instant::now() + self.request_timeout;

        trace.enter(ProtocolState::Received);
        let node = NodeId::canonicalize(raw_id)?;

        trace.enter(ProtocolState::Validating);
        let validation = match bounded(self.validator.validate_node(&node), deadline, cancel).await {
            Ok(result) => result,
            Err(Interrupted::Cancelled) => {
                return Err(BootstrapError::Cancelled {
                    during: ProtocolState::Validating,
                })
            }
            Err(Interrupted::DeadlineExceeded) => Err(ValidationFault::Timeout {
                after_ms: self.request_timeout.as_millis() as u64,
            }),
        };
        match validation {
            Ok(Validation::Accepted { status }) => {
                debug!("Node {} validated with status '{}'", node, status);
            }
            Ok(Validation::Rejected { status }) => {
                return Err(BootstrapError::ValidationRejected { node, status });
            }
            Err(fault) => return Err(BootstrapError::ValidationFault { node, fault }),
        }
        trace.enter(ProtocolState::Validated);

        trace.enter(ProtocolState::Resolving);
        let resolved = match bounded(self.resolver.resolve(&node), deadline, cancel).await {
            Ok(result) => result,
            Err(Interrupted::Cancelled) => {
                return Err(BootstrapError::Cancelled {
                    during: ProtocolState::Resolving,
                })
            }
            Err(Interrupted::DeadlineExceeded) => Err(ResolveError::Fault(format!(
                "request deadline of {}ms exceeded",
                self.request_timeout.as_millis()
            ))),
        };
        match resolved {
            Ok(creds) => {
                info!("Node {} bootstrapped to org {}", node, creds.org);
                Ok(creds)
            }
            Err(ResolveError::NotFound(reason)) => {
                warn!("Validated node {} has no owning organization", node);
                Err(BootstrapError::LookupNotFound { node, reason })
            }
            Err(ResolveError::Fault(reason)) => Err(BootstrapError::LookupFault { node, reason }),
        }
    }
}

async fn bounded<F: Future>(
    fut: F,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Result<F::Output, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        res = tokio::time::timeout_at(deadline, fut) => res.map_err(|_| Interrupted::DeadlineExceeded),
    }
}
