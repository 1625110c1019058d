//! HTTP utilities for Funnel REST API calls

use crate::error::{FunnelError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// HTTP client wrapper for Funnel API calls
#[derive(Clone, Debug)]
pub struct FunnelHttpClient {
    client: Client,
}

impl FunnelHttpClient {
    /// Create a new HTTP client sending JSON with a versioned user agent
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(format!("funnelctl/{}", crate::VERSION))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Underlying client, shared with the token exchange
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET an entity. A 404 means the entity does not exist and yields `None`.
    pub async fn get<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<Option<T>> {
        match self.send::<()>(Method::GET, url, token, None).await {
            Ok(body) => parse_body(&body, url).map(Some),
            Err(FunnelError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// POST a new entity and parse the created entity from the response
    pub async fn post<B, T>(&self, url: &str, token: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, url, token, Some(body)).await?;
        parse_body(&response, url)
    }

    /// PUT an updated entity. A 404 is an error here.
    pub async fn put<B, T>(&self, url: &str, token: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, url, token, Some(body)).await?;
        parse_body(&response, url)
    }

    /// DELETE an entity. Deleting something already gone is not an error.
    pub async fn delete(&self, url: &str, token: &str) -> Result<()> {
        match self.send::<()>(Method::DELETE, url, token, None).await {
            Ok(_) | Err(FunnelError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<String> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Error reaching {}: {}", url, e);
            FunnelError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(error_for_status(status, &body));
        }

        Ok(body)
    }
}

/// Map a non-2xx response onto the error taxonomy
pub fn error_for_status(status: StatusCode, body: &str) -> FunnelError {
    let details = serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_string()));

    match status {
        StatusCode::BAD_REQUEST => FunnelError::BadRequest {
            message: details
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("bad request")
                .to_string(),
            details,
        },
        StatusCode::UNAUTHORIZED => FunnelError::Unauthorized,
        StatusCode::FORBIDDEN => FunnelError::Forbidden { details },
        StatusCode::NOT_FOUND => FunnelError::NotFound,
        StatusCode::CONFLICT => FunnelError::Conflict { details },
        StatusCode::TOO_MANY_REQUESTS => FunnelError::RateLimited,
        _ => FunnelError::Api {
            status: status.as_u16(),
            details,
        },
    }
}

fn parse_body<T: DeserializeOwned>(body: &str, url: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!("Unexpected response from {}: {}", url, e);
        FunnelError::InvalidResponse(url.to_string())
    })
}

/// Format an API error for display
/// Security: keeps raw response bodies out of the one-line summary
pub fn format_api_error(error: &FunnelError) -> String {
    match error {
        FunnelError::Unauthorized => {
            "Authentication failed. Check client_id and client_secret.".to_string()
        }
        FunnelError::Forbidden { .. } => {
            "Permission denied or subscription limit reached.".to_string()
        }
        FunnelError::NotFound => "Resource not found.".to_string(),
        FunnelError::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
        FunnelError::Conflict { .. } => {
            "Resource conflict. An entity with the same configuration already exists.".to_string()
        }
        FunnelError::Api { status, .. } if *status >= 500 => {
            "Funnel service temporarily unavailable. Please try again.".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bad_request_uses_remote_message() {
        let err = error_for_status(StatusCode::BAD_REQUEST, r#"{"error": "name is required"}"#);
        match err {
            FunnelError::BadRequest { message, details } => {
                assert_eq!(message, "name is required");
                assert_eq!(details, json!({"error": "name is required"}));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_request_without_message() {
        let err = error_for_status(StatusCode::BAD_REQUEST, "oops");
        assert_eq!(err.to_string(), "bad request (status code: 400)");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(error_for_status(StatusCode::UNAUTHORIZED, ""), FunnelError::Unauthorized));
        assert!(matches!(error_for_status(StatusCode::NOT_FOUND, ""), FunnelError::NotFound));
        assert!(matches!(error_for_status(StatusCode::TOO_MANY_REQUESTS, ""), FunnelError::RateLimited));
        assert_eq!(error_for_status(StatusCode::CONFLICT, "{}").status_code(), Some(409));
        assert_eq!(error_for_status(StatusCode::FORBIDDEN, "{}").status_code(), Some(403));
        assert_eq!(
            error_for_status(StatusCode::BAD_GATEWAY, "upstream").details(),
            Some(&json!("upstream"))
        );
    }

    #[test]
    fn test_sanitize_truncates() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(out.contains("500 bytes total"));
    }

    #[test]
    fn test_format_api_error() {
        assert_eq!(format_api_error(&FunnelError::NotFound), "Resource not found.");
        let err = FunnelError::BadRequest {
            message: "bad schedule".to_string(),
            details: Value::Null,
        };
        assert_eq!(format_api_error(&err), "bad schedule (status code: 400)");
    }
}
