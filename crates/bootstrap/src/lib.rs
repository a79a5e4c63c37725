//! nodeinit bootstrap service
//!
//! Validates a field node against the manufacturing registry, then resolves
//! it to the organization that owns it so the node can connect home.

pub mod config;
pub mod mfg_status;
pub mod orchestrator;
pub mod resolver;
pub mod routes;
pub mod validator;

pub use config::{BootstrapConfig, LookupTarget, NmrConfig};
pub use mfg_status::MfgStatus;
pub use orchestrator::{BootstrapError, BootstrapOutcome, BootstrapTrace, Orchestrator, ProtocolState};
pub use resolver::{LookupClient, NodeResolver, ResolveError};
pub use routes::{bootstrap_router, AppState, LOOKING_FOR_VALIDATION};
pub use validator::{NmrClient, NodeValidator, Validation, ValidationFault};
