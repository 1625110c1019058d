//! API payload shapes
//!
//! These mirror the JSON the control plane reads and writes. String leaves are
//! plain values where an empty string means "not set"; numbers and flags are
//! `Option` and left out when unset. All structs deserialize leniently
//! (`#[serde(default)]`) since the API omits fields it has no value for.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    pub metrics: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub headers: String,
}

/// One exported column. `export_name` travels as `name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "name")]
    pub export_name: String,
    pub export_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSchema {
    pub by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub per: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingDate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<i64>,
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRange {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub start: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub end: String,
    #[serde(rename = "last", skip_serializing_if = "Option::is_none")]
    pub rolling_start: Option<RollingDate>,
    #[serde(rename = "rollingEnd", skip_serializing_if = "Option::is_none")]
    pub rolling_end: Option<RollingDate>,
}

/// Flat filter condition. Never serialized directly; it travels as a
/// [`FilterExpr`](super::meld::FilterExpr) inside [`Query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportFilter {
    pub field_id: String,
    pub operation: String,
    pub value: String,
    pub or: Vec<ExportFilterOr>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportFilterOr {
    pub operation: String,
    pub value: String,
}

/// Fields, range and filter live in a nested query object on the API side.
///
/// `filter` is the raw Meld JSON. It becomes a
/// [`FilterExpr`](super::meld::FilterExpr) when an export is restored, so a bad
/// expression is a conversion failure and not an unreadable response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub fields: Vec<ExportField>,
    pub range: ExportRange,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
}

/// Envelope shared by every export destination.
///
/// `fields`, `range` and `filters` hold the flat declarative values while a
/// payload is being prepared or restored; only `query` is sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportShared {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub export_type: String,
    pub schedule: String,
    pub workspace: String,
    pub format: ExportFormat,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub currency: String,
    pub partition_schema: PartitionSchema,
    pub query: Query,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "onlyAllowEditFromAPI")]
    pub only_allow_edit_from_api: bool,
    #[serde(skip)]
    pub fields: Vec<ExportField>,
    #[serde(skip)]
    pub range: ExportRange,
    #[serde(skip)]
    pub filters: Vec<ExportFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
}

impl Workspace {
    /// Responses carry the id as `id` or `workspaceId`. Either may be missing,
    /// leaving `id` empty.
    pub fn from_response(value: &serde_json::Value) -> Self {
        let id = ["id", "workspaceId"]
            .iter()
            .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
            .find(|id| !id.is_empty())
            .unwrap_or_default();

        Self {
            id: id.to_string(),
            name: value
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// `GET /subscriptions/{sub}/workspaces`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceList {
    pub data: Vec<Workspace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataSource {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub workspace: String,
    pub source_type: String,
    pub credential_id: String,
    pub account_id: String,
    pub name: String,
    pub demo: bool,
}

/// `GET /subscriptions/{sub}/workspaces/{ws}/fields/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub export_type: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}
