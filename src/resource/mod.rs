//! Resource operations
//!
//! Create, read, update and delete for every entity the crate manages. Each
//! operation takes the [`FunnelClient`](crate::funnel::FunnelClient) by
//! reference, translates the declarative model to the API payload and back,
//! and issues exactly one request.
//!
//! # Module Structure
//!
//! - [`workspace`] - Subscription workspaces
//! - [`data_source`] - Workspace data sources
//! - [`export_field`] - Field lookup for export field lists
//! - [`export`] - Data exports (BigQuery, GCS, Snowflake, Measurement)
//!
//! Reads return `Ok(None)` when the entity is gone, so the caller can drop it
//! from its state. Deletes of missing entities succeed.
//!
//! # Example
//!
//! ```ignore
//! use funnelctl::resource::export::{read_export, GcsExport};
//!
//! async fn example(client: &funnelctl::funnel::FunnelClient) -> funnelctl::Result<()> {
//!     if let Some(export) = read_export::<GcsExport>(client, "ws-1", "exp-1").await? {
//!         println!("{:?}", export.destination.bucket);
//!     }
//!     Ok(())
//! }
//! ```

pub mod data_source;
pub mod export;
pub mod export_field;
pub mod workspace;
