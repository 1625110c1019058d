//! Funnel Authentication
//!
//! Exchanges OAuth2 client credentials for a bearer token. The token is
//! fetched once per process: there is no caching layer and no refresh, so an
//! expired token means running the command again.

use crate::error::{FunnelError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

const GRANT_TYPE: &str = "client_credentials";

/// Client credentials request body
#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
    grant_type: &'a str,
}

/// Response from the token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Bearer token for the control-plane API
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Security: never print the token itself
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Request an access token with the client-credentials grant.
///
/// Any non-200 answer or an unreadable body is an [`FunnelError::Auth`].
pub async fn fetch_access_token(
    http: &Client,
    token_endpoint: &str,
    audience: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken> {
    tracing::info!(
        client_id,
        audience,
        token_endpoint,
        "Getting access token"
    );

    let request = TokenRequest {
        client_id,
        client_secret,
        audience,
        grant_type: GRANT_TYPE,
    };

    let response = http
        .post(token_endpoint)
        .json(&request)
        .send()
        .await
        .map_err(|e| FunnelError::Auth {
            status: None,
            message: format!("failed to request token: {}", e),
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| FunnelError::Auth {
        status: Some(status.as_u16()),
        message: format!("failed to read token response: {}", e),
    })?;

    if status != reqwest::StatusCode::OK {
        return Err(FunnelError::Auth {
            status: Some(status.as_u16()),
            message: format!("{} - {}", status, body),
        });
    }

    let token: TokenResponse = serde_json::from_str(&body).map_err(|e| FunnelError::Auth {
        status: Some(status.as_u16()),
        message: format!("failed to decode token response: {}", e),
    })?;

    tracing::debug!(
        token_type = %token.token_type,
        expires_in = token.expires_in,
        "Access token acquired"
    );

    Ok(AccessToken(token.access_token))
}
