//! Error types
//!
//! Every fallible library operation returns [`FunnelError`]. Nothing is retried
//! internally; callers decide what a given kind means for them (for example a
//! [`FunnelError::NotFound`] on read is already folded into `Ok(None)`).

use serde_json::Value;
use thiserror::Error;

use crate::mapping::ConversionError;

/// Result alias used across the crate
pub type Result<T, E = FunnelError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FunnelError {
    /// Token acquisition failed. Fatal for the whole session.
    #[error("failed to obtain access token: {message}")]
    Auth {
        status: Option<u16>,
        message: String,
    },

    #[error("Unauthorized (status code: 401)")]
    Unauthorized,

    #[error("Not Found (status code: 404)")]
    NotFound,

    /// An entity with the same configuration already exists
    #[error("Conflict (status code: 409)")]
    Conflict { details: Value },

    /// Usually a subscription limit (workspaces, exports) has been reached
    #[error("Forbidden - limit reached (status code: 403)")]
    Forbidden { details: Value },

    #[error("Too Many Requests (status code: 429)")]
    RateLimited,

    /// The remote error message, verbatim
    #[error("{message} (status code: 400)")]
    BadRequest { message: String, details: Value },

    #[error("request failed (status code: {status})")]
    Api { status: u16, details: Value },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("export {id} is not a {expected} export (type: {actual})")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        actual: String,
    },

    /// A resource is missing an attribute the operation needs (id, workspace)
    #[error("missing required attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("expected import ID in format 'workspace_id/export_id', got: {0}")]
    InvalidImportId(String),

    #[error("invalid response from {0}")]
    InvalidResponse(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FunnelError {
    /// HTTP status behind this error, when there is one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FunnelError::Auth { status, .. } => *status,
            FunnelError::Unauthorized => Some(401),
            FunnelError::Forbidden { .. } => Some(403),
            FunnelError::NotFound => Some(404),
            FunnelError::Conflict { .. } => Some(409),
            FunnelError::RateLimited => Some(429),
            FunnelError::BadRequest { .. } => Some(400),
            FunnelError::Api { status, .. } => Some(*status),
            FunnelError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Details blob returned by the API alongside the error
    pub fn details(&self) -> Option<&Value> {
        match self {
            FunnelError::Conflict { details }
            | FunnelError::Forbidden { details }
            | FunnelError::BadRequest { details, .. }
            | FunnelError::Api { details, .. } => Some(details),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FunnelError::NotFound)
    }
}
