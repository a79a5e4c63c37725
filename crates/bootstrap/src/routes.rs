//! Bootstrap API routes
//!
//! Nodes call `GET /{node_id}?looking_for=validation` (or the query form
//! `GET /?node=...&looking_for=validation`) and receive the certificate and
//! address of their owning organization.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use nodeinit_common::{BootstrapResponse, Error};

use crate::orchestrator::Orchestrator;

/// `looking_for` value expected on bootstrap requests
pub const LOOKING_FOR_VALIDATION: &str = "validation";

/// Shared state for bootstrap handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Cancelled on shutdown; every request runs under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, shutdown: CancellationToken) -> Self {
        Self {
            orchestrator,
            shutdown,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BootstrapQuery {
    node: Option<String>,
    looking_for: Option<String>,
}

pub fn bootstrap_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/", get(bootstrap_query_handler))
        .route("/:node_id", get(bootstrap_path_handler))
        .with_state(state)
}

async fn ping_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "bootstrap"
    }))
}

async fn bootstrap_query_handler(
    State(state): State<AppState>,
    Query(query): Query<BootstrapQuery>,
) -> Response {
    if let Err(e) = check_looking_for(query.looking_for.as_deref()) {
        return e.into_response();
    }
    match query.node {
        Some(node) => bootstrap(&state, &node).await,
        None => Error::InvalidRequest("missing 'node' parameter".to_string()).into_response(),
    }
}

async fn bootstrap_path_handler(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Query(query): Query<BootstrapQuery>,
) -> Response {
    if let Err(e) = check_looking_for(query.looking_for.as_deref()) {
        return e.into_response();
    }
    bootstrap(&state, &node_id).await
}

fn check_looking_for(looking_for: Option<&str>) -> Result<(), Error> {
    if looking_for == Some(LOOKING_FOR_VALIDATION) {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "looking_for must be '{}'",
            LOOKING_FOR_VALIDATION
        )))
    }
}

async fn bootstrap(state: &AppState, raw_id: &str) -> Response {
    let cancel = state.shutdown.child_token();
    // Dropping the handler future (client went away) cancels the run.
    let _guard = cancel.clone().drop_guard();

    let outcome = state.orchestrator.run(raw_id, &cancel).await;
    match outcome.result {
        Ok(creds) => Json(BootstrapResponse::from(&creds)).into_response(),
        Err(e) => e.into_response(),
    }
}
