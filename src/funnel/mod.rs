//! Funnel API interaction module
//!
//! This module provides the transport for the Funnel control plane:
//! authentication, the HTTP client and the entity client.
//!
//! # Module Structure
//!
//! - [`auth`] - OAuth2 client-credentials token exchange
//! - [`client`] - Entity CRUD under `/subscriptions/{id}/...`
//! - [`http`] - HTTP utilities and status-code mapping
//!
//! # Example
//!
//! ```ignore
//! use funnelctl::funnel::client::FunnelClient;
//!
//! async fn example(settings: &funnelctl::config::ProviderSettings) -> funnelctl::Result<()> {
//!     let client = FunnelClient::connect(settings).await?;
//!     let workspaces: Option<serde_json::Value> =
//!         client.list_subscription_entities("workspaces").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

pub use auth::AccessToken;
pub use client::FunnelClient;
