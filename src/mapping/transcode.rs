//! Model <-> wire field transcoding
//!
//! Each declarative type names its wire counterpart and spells out the field
//! correspondence, so a renamed or retyped field is a compile error rather
//! than a silently dropped value.
//!
//! Leaf rules, in both directions:
//!
//! | model            | wire     |
//! |------------------|----------|
//! | `Some(s)`        | `s`      |
//! | `None`           | `""`     |
//! | `Some(n)`        | `n`      |
//! | `Some(b)`        | `b`      |
//! | `None`           | omitted  |
//!
//! An empty string reads back as `None`. Integers and booleans are optional on
//! the wire as well, so `0` and `false` survive a round trip as real values.

use super::model::{self, PartitionBy, PartitionPer};
use super::wire;
use super::ConversionError;

pub trait Transcode: Sized {
    type Wire;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError>;

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError>;
}

// =========================================================================
// Leaves
// =========================================================================

impl Transcode for Option<String> {
    type Wire = String;

    fn to_wire(&self) -> Result<String, ConversionError> {
        Ok(self.clone().unwrap_or_default())
    }

    fn from_wire(wire: &String) -> Result<Self, ConversionError> {
        Ok((!wire.is_empty()).then(|| wire.clone()))
    }
}

impl Transcode for Option<i64> {
    type Wire = Option<i64>;

    fn to_wire(&self) -> Result<Option<i64>, ConversionError> {
        Ok(*self)
    }

    fn from_wire(wire: &Option<i64>) -> Result<Self, ConversionError> {
        Ok(*wire)
    }
}

impl Transcode for Option<bool> {
    type Wire = Option<bool>;

    fn to_wire(&self) -> Result<Option<bool>, ConversionError> {
        Ok(*self)
    }

    fn from_wire(wire: &Option<bool>) -> Result<Self, ConversionError> {
        Ok(*wire)
    }
}

impl Transcode for Option<PartitionBy> {
    type Wire = String;

    fn to_wire(&self) -> Result<String, ConversionError> {
        Ok(self.map(|by| by.as_str().to_string()).unwrap_or_default())
    }

    fn from_wire(wire: &String) -> Result<Self, ConversionError> {
        if wire.is_empty() {
            return Ok(None);
        }
        wire.parse().map(Some)
    }
}

impl Transcode for Option<PartitionPer> {
    type Wire = String;

    fn to_wire(&self) -> Result<String, ConversionError> {
        Ok(self.map(|per| per.as_str().to_string()).unwrap_or_default())
    }

    fn from_wire(wire: &String) -> Result<Self, ConversionError> {
        if wire.is_empty() {
            return Ok(None);
        }
        wire.parse().map(Some)
    }
}

impl<T: Transcode> Transcode for Vec<T> {
    type Wire = Vec<T::Wire>;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        self.iter().map(T::to_wire).collect()
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        wire.iter().map(T::from_wire).collect()
    }
}

/// Optional nested object: absent on one side stays absent on the other
pub fn optional_to_wire<T: Transcode>(value: &Option<T>) -> Result<Option<T::Wire>, ConversionError> {
    value.as_ref().map(T::to_wire).transpose()
}

pub fn optional_from_wire<T: Transcode>(wire: &Option<T::Wire>) -> Result<Option<T>, ConversionError> {
    wire.as_ref().map(T::from_wire).transpose()
}

// =========================================================================
// Export envelope
// =========================================================================

impl Transcode for model::ExportField {
    type Wire = wire::ExportField;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::ExportField {
            id: self.id.to_wire()?,
            field_type: self.field_type.to_wire()?,
            export_name: self.export_name.to_wire()?,
            export_type: self.export_type.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            id: Transcode::from_wire(&wire.id)?,
            field_type: Transcode::from_wire(&wire.field_type)?,
            export_name: Transcode::from_wire(&wire.export_name)?,
            export_type: Transcode::from_wire(&wire.export_type)?,
        })
    }
}

impl Transcode for model::ExportFormat {
    type Wire = wire::ExportFormat;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::ExportFormat {
            format_type: self.format_type.to_wire()?,
            metrics: self.metrics.to_wire()?,
            headers: String::new(),
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            format_type: Transcode::from_wire(&wire.format_type)?,
            metrics: Transcode::from_wire(&wire.metrics)?,
        })
    }
}

impl Transcode for model::PartitionSchema {
    type Wire = wire::PartitionSchema;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::PartitionSchema {
            by: self.by.to_wire()?,
            per: self.per.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            by: Transcode::from_wire(&wire.by)?,
            per: Transcode::from_wire(&wire.per)?,
        })
    }
}

impl Transcode for model::RollingDate {
    type Wire = wire::RollingDate;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::RollingDate {
            periods: self.periods.to_wire()?,
            period: self.period.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            periods: Transcode::from_wire(&wire.periods)?,
            period: Transcode::from_wire(&wire.period)?,
        })
    }
}

impl Transcode for model::ExportRange {
    type Wire = wire::ExportRange;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::ExportRange {
            start: self.start.to_wire()?,
            end: self.end.to_wire()?,
            rolling_start: optional_to_wire(&self.rolling_start)?,
            rolling_end: optional_to_wire(&self.rolling_end)?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            start: Transcode::from_wire(&wire.start)?,
            end: Transcode::from_wire(&wire.end)?,
            rolling_start: optional_from_wire(&wire.rolling_start)?,
            rolling_end: optional_from_wire(&wire.rolling_end)?,
        })
    }
}

impl Transcode for model::FilterOr {
    type Wire = wire::ExportFilterOr;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::ExportFilterOr {
            operation: self.operation.to_wire()?,
            value: self.value.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            operation: Transcode::from_wire(&wire.operation)?,
            value: Transcode::from_wire(&wire.value)?,
        })
    }
}

impl Transcode for model::ExportFilter {
    type Wire = wire::ExportFilter;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::ExportFilter {
            field_id: self.field_id.to_wire()?,
            operation: self.operation.to_wire()?,
            value: self.value.to_wire()?,
            or: self.or.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            field_id: Transcode::from_wire(&wire.field_id)?,
            operation: Transcode::from_wire(&wire.operation)?,
            value: Transcode::from_wire(&wire.value)?,
            or: Transcode::from_wire(&wire.or)?,
        })
    }
}

/// Fills the flat `fields`/`range`/`filters`; building `query` is up to the
/// destination preparer.
impl Transcode for model::ExportShared {
    type Wire = wire::ExportShared;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::ExportShared {
            id: self.id.to_wire()?,
            name: self.name.to_wire()?,
            workspace: self.workspace.to_wire()?,
            schedule: self.schedule.to_wire()?,
            notes: self.notes.to_wire()?,
            currency: self.currency.to_wire()?,
            fields: self.fields.to_wire()?,
            format: self.format.to_wire()?,
            partition_schema: self.partition_schema.to_wire()?,
            range: self.range.to_wire()?,
            enabled: self.enabled.to_wire()?,
            filters: self.filters.to_wire()?,
            ..Default::default()
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            id: Transcode::from_wire(&wire.id)?,
            name: Transcode::from_wire(&wire.name)?,
            workspace: Transcode::from_wire(&wire.workspace)?,
            schedule: Transcode::from_wire(&wire.schedule)?,
            notes: Transcode::from_wire(&wire.notes)?,
            currency: Transcode::from_wire(&wire.currency)?,
            fields: Transcode::from_wire(&wire.fields)?,
            format: Transcode::from_wire(&wire.format)?,
            partition_schema: Transcode::from_wire(&wire.partition_schema)?,
            range: Transcode::from_wire(&wire.range)?,
            enabled: Transcode::from_wire(&wire.enabled)?,
            filters: Transcode::from_wire(&wire.filters)?,
        })
    }
}

// =========================================================================
// Workspaces, data sources, fields
// =========================================================================

impl Transcode for model::Workspace {
    type Wire = wire::Workspace;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::Workspace {
            id: self.id.to_wire()?,
            name: self.name.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            id: Transcode::from_wire(&wire.id)?,
            name: Transcode::from_wire(&wire.name)?,
        })
    }
}

impl Transcode for model::DataSource {
    type Wire = wire::DataSource;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::DataSource {
            id: self.id.to_wire()?,
            workspace: self.workspace.to_wire()?,
            source_type: self.source_type.to_wire()?,
            credential_id: self.credential_id.to_wire()?,
            account_id: self.account_id.to_wire()?,
            name: self.name.to_wire()?,
            demo: false,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            id: Transcode::from_wire(&wire.id)?,
            workspace: Transcode::from_wire(&wire.workspace)?,
            source_type: Transcode::from_wire(&wire.source_type)?,
            credential_id: Transcode::from_wire(&wire.credential_id)?,
            account_id: Transcode::from_wire(&wire.account_id)?,
            name: Transcode::from_wire(&wire.name)?,
        })
    }
}

/// The API knows nothing about the workspace or the export-name override;
/// those stay with the caller.
impl Transcode for model::Field {
    type Wire = wire::Field;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(wire::Field {
            id: self.id.to_wire()?,
            export_type: self.export_type.to_wire()?,
            name: self.name.to_wire()?,
            field_type: self.field_type.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            id: Transcode::from_wire(&wire.id)?,
            name: Transcode::from_wire(&wire.name)?,
            field_type: Transcode::from_wire(&wire.field_type)?,
            export_type: Transcode::from_wire(&wire.export_type)?,
            ..Default::default()
        })
    }
}
