//! Translation between the declarative model and the Funnel API schema
//!
//! The declarative side ([`model`]) is flat and uses optional leaves, the way an
//! IaC tool hands configuration over. The wire side ([`wire`]) is the JSON the
//! control plane speaks, with plain leaves, renamed fields and a nested query
//! object.
//!
//! # Module Structure
//!
//! - [`meld`] - Filter lists <-> Meld boolean expressions (`=and` / `=or` / `=<op>`)
//! - [`transcode`] - Field-by-field conversion between model and wire shapes
//! - [`model`] - Declarative resource shapes
//! - [`wire`] - API payload shapes

pub mod meld;
pub mod model;
pub mod transcode;
pub mod wire;

use thiserror::Error;

pub use meld::{Condition, FieldExpr, FilterExpr, LeafOp};
pub use transcode::Transcode;

/// A value could not be mapped between the model and wire shapes.
///
/// With well-typed schemas this points at a schema bug or at an API response
/// the mapping does not understand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conversion failed: {0}")]
pub struct ConversionError(pub String);

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
