//! Declarative resource shapes
//!
//! This is what a user writes in a resource file and what reads hand back.
//! Optional leaves stay `None` when the user did not set them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConversionError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_type: Option<String>,
}

/// Output format. `format_type` is one of `parquet`, `csv` or `tsv`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub format_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionBy {
    None,
    Date,
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionPer {
    Day,
    Month,
    Year,
    All,
}

impl PartitionBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionBy::None => "none",
            PartitionBy::Date => "date",
            PartitionBy::Snapshot => "snapshot",
        }
    }
}

impl PartitionPer {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionPer::Day => "day",
            PartitionPer::Month => "month",
            PartitionPer::Year => "year",
            PartitionPer::All => "all",
        }
    }
}

impl FromStr for PartitionBy {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(PartitionBy::None),
            "date" => Ok(PartitionBy::Date),
            "snapshot" => Ok(PartitionBy::Snapshot),
            other => Err(ConversionError::new(format!(
                "unknown partition 'by' value: {}",
                other
            ))),
        }
    }
}

impl FromStr for PartitionPer {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(PartitionPer::Day),
            "month" => Ok(PartitionPer::Month),
            "year" => Ok(PartitionPer::Year),
            "all" => Ok(PartitionPer::All),
            other => Err(ConversionError::new(format!(
                "unknown partition 'per' value: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PartitionBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PartitionPer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `per` has no meaning when partitioning by snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<PartitionBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per: Option<PartitionPer>,
}

/// Relative bound, e.g. `periods: -7, period: days`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingDate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periods: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

/// Each bound is either absolute (`start`/`end`) or rolling, not both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_start: Option<RollingDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_end: Option<RollingDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOr {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Either `operation` + `value`, or a non-empty `or` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<FilterOr>,
}

/// Attributes every export carries regardless of destination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportShared {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// ISO 4217 code; unset means the workspace default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub fields: Vec<ExportField>,
    pub format: ExportFormat,
    pub partition_schema: PartitionSchema,
    pub range: ExportRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ExportFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A connection pulling data from an ad platform or warehouse into a workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// One of [`DATA_SOURCE_TYPES`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

pub const DATA_SOURCE_TYPES: &[&str] = &["adwords", "bigquery_ga4", "bigquery_ga4_mta"];

/// Field lookup result, ready to drop into an export's `fields` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Name shown in the Funnel app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_type: Option<String>,
}

impl From<&Field> for ExportField {
    fn from(field: &Field) -> Self {
        Self {
            id: field.id.clone(),
            field_type: field.field_type.clone(),
            export_name: field.export_name.clone(),
            export_type: field.export_type.clone(),
        }
    }
}
