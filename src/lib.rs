//! funnelctl - manage Funnel workspaces, data sources and exports as code
//!
//! The library translates declarative resource definitions into Funnel
//! control-plane API calls and reads them back for drift detection.
//!
//! - [`mapping`] - model <-> API translation (Meld filters, field transcoding)
//! - [`funnel`] - authentication and the entity REST client
//! - [`resource`] - per-resource operations
//! - [`config`] - provider settings

pub mod config;
pub mod error;
pub mod funnel;
pub mod mapping;
pub mod resource;

pub use error::{FunnelError, Result};

/// Version reported in the user agent. Overridable at build time.
pub const VERSION: &str = match option_env!("FUNNELCTL_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
