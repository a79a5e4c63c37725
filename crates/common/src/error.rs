//! Error types for nodeinit

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::address::AddressError;
use crate::node_id::NodeIdError;
use crate::org_name::OrgNameError;

/// Result type alias using nodeinit Error
pub type Result<T> = std::result::Result<T, Error>;

/// nodeinit error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed node identifier: {0}")]
    MalformedIdentifier(#[from] NodeIdError),

    #[error("Invalid organization name: {0}")]
    InvalidName(#[from] OrgNameError),

    #[error("Invalid organization address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Organization {name} not found")]
    OrgNotFound { name: String },

    #[error("No organization mapping for node {node}")]
    MappingNotFound { node: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MalformedIdentifier(_)
            | Error::InvalidName(_)
            | Error::InvalidAddress(_)
            | Error::InvalidCertificate(_)
            | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::OrgNotFound { .. } | Error::MappingNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Database(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Missing organization or mapping, as opposed to bad input or a store fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::OrgNotFound { .. } | Error::MappingNotFound { .. })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
