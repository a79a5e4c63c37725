//! Lookup API routes
//!
//! - Organization credential registration and reads
//! - Node to organization mapping registration
//! - Node credential lookup used by the bootstrap service

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use nodeinit_common::{
    decode_certificate, Error, NodeCredentialsResponse, NodeId, NodeMappingResponse, OrgListResponse,
    OrgResponse, Result, UpsertOrgRequest,
};

use crate::service::LookupService;
use crate::store::{CredentialStore, MappingStore};

/// `looking_for` value expected on node credential lookups
pub const LOOKING_FOR_CREDENTIALS: &str = "org_credentials";

#[derive(Debug, Deserialize)]
struct NodeQuery {
    node: Option<String>,
    looking_for: Option<String>,
}

/// Create the lookup router over a shared service
pub fn lookup_router<S>(service: Arc<LookupService<S>>) -> Router
where
    S: MappingStore + CredentialStore + 'static,
{
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/orgs", get(list_orgs_handler::<S>))
        // Static segment; takes priority over /orgs/:org
        .route("/orgs/node", get(node_credentials_handler::<S>))
        .route(
            "/orgs/:org",
            get(get_org_handler::<S>).post(upsert_org_handler::<S>),
        )
        .route(
            "/orgs/:org/devices/:node_id",
            get(get_device_handler::<S>).post(add_device_handler::<S>),
        )
        .with_state(service)
}

fn parse_node_id(raw: &str) -> Result<NodeId> {
    Ok(NodeId::canonicalize(raw)?)
}

// Extractor rejections are reported through the same `{"error"}` bodies.

fn bad_body(rejection: JsonRejection) -> Error {
    Error::InvalidRequest(rejection.body_text())
}

fn bad_query(rejection: QueryRejection) -> Error {
    Error::InvalidRequest(rejection.body_text())
}

// ============================================================================
// Handlers
// ============================================================================

async fn ping_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lookup"
    }))
}

async fn list_orgs_handler<S>(State(svc): State<Arc<LookupService<S>>>) -> Result<Json<OrgListResponse>>
where
    S: MappingStore + CredentialStore,
{
    let orgs = svc.list_organizations()?;
    Ok(Json(OrgListResponse { orgs }))
}

async fn get_org_handler<S>(
    State(svc): State<Arc<LookupService<S>>>,
    Path(org): Path<String>,
) -> Result<Json<OrgResponse>>
where
    S: MappingStore + CredentialStore,
{
    let org = svc.get_organization(&org)?;
    Ok(Json(OrgResponse::from(&org)))
}

async fn upsert_org_handler<S>(
    State(svc): State<Arc<LookupService<S>>>,
    Path(org): Path<String>,
    body: std::result::Result<Json<UpsertOrgRequest>, JsonRejection>,
) -> Result<Json<OrgResponse>>
where
    S: MappingStore + CredentialStore,
{
    let Json(req) = body.map_err(bad_body)?;
    let certificate = decode_certificate(&req.certificate)?;
    let org = svc.upsert_organization(&org, &certificate, &req.ip)?;
    Ok(Json(OrgResponse::from(&org)))
}

async fn add_device_handler<S>(
    State(svc): State<Arc<LookupService<S>>>,
    Path((org, node_id)): Path<(String, String)>,
) -> Result<Json<NodeMappingResponse>>
where
    S: MappingStore + CredentialStore,
{
    let node = parse_node_id(&node_id)?;
    let mapping = svc.add_or_update_mapping(&node, &org)?;
    Ok(Json(NodeMappingResponse::from(&mapping)))
}

async fn get_device_handler<S>(
    State(svc): State<Arc<LookupService<S>>>,
    Path((org, node_id)): Path<(String, String)>,
) -> Result<Json<NodeCredentialsResponse>>
where
    S: MappingStore + CredentialStore,
{
    let node = parse_node_id(&node_id)?;
    let creds = svc.get_node_for_org(&org, &node)?;
    Ok(Json(NodeCredentialsResponse::from(&creds)))
}

async fn node_credentials_handler<S>(
    State(svc): State<Arc<LookupService<S>>>,
    query: std::result::Result<Query<NodeQuery>, QueryRejection>,
) -> Result<Json<NodeCredentialsResponse>>
where
    S: MappingStore + CredentialStore,
{
    let Query(query) = query.map_err(bad_query)?;
    if query.looking_for.as_deref() != Some(LOOKING_FOR_CREDENTIALS) {
        return Err(Error::InvalidRequest(format!(
            "looking_for must be '{}'",
            LOOKING_FOR_CREDENTIALS
        )));
    }
    let raw = query
        .node
        .ok_or_else(|| Error::InvalidRequest("missing 'node' parameter".to_string()))?;
    let node = parse_node_id(&raw)?;
    debug!("Credential lookup for node {}", node);

    let creds = svc.resolve_node(&node)?;
    Ok(Json(NodeCredentialsResponse::from(&creds)))
}
