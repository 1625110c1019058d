//! Measurement exports
//!
//! Internal destination writing to a Funnel-managed iceberg table. The
//! export is hidden in the Funnel app. Setting all three snapshot attributes
//! turns it into a snapshot export, partitioned by snapshot.

use serde::{Deserialize, Serialize};

use super::{ExportPayload, ExportResource};
use crate::mapping::model::{ExportShared, PartitionBy, PartitionSchema};
use crate::mapping::{wire, ConversionError, Transcode};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_source_type: Option<String>,
}

impl MeasurementDestination {
    fn snapshot_query(&self) -> Option<SnapshotQuery> {
        match (
            &self.snapshot_table_id,
            &self.snapshot_source_id,
            &self.snapshot_source_type,
        ) {
            (Some(table_id), Some(source_id), Some(source_type)) => Some(SnapshotQuery {
                snapshot_table_id: table_id.clone(),
                source_id: source_id.clone(),
                source_type: source_type.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementExport {
    pub destination: MeasurementDestination,
    #[serde(flatten)]
    pub shared: ExportShared,
}

/// `outputIdTemplate` carries the table name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasurementDestinationPayload {
    #[serde(rename = "type")]
    pub destination_type: String,
    pub output_id_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotQuery {
    pub snapshot_table_id: String,
    pub source_id: String,
    pub source_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementPayload {
    pub destination: MeasurementDestinationPayload,
    pub hidden: bool,
    #[serde(rename = "snapshotQuery", skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotQuery>,
    #[serde(flatten)]
    pub shared: wire::ExportShared,
}

/// Snapshot attributes are not part of the plain mapping; they move through
/// `snapshotQuery` in [`ExportResource::prepare_destination`] and
/// [`ExportResource::restore_destination`].
impl Transcode for MeasurementExport {
    type Wire = MeasurementPayload;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(MeasurementPayload {
            destination: MeasurementDestinationPayload {
                destination_type: String::new(),
                output_id_template: self.destination.table_name.to_wire()?,
            },
            shared: self.shared.to_wire()?,
            ..Default::default()
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            destination: MeasurementDestination {
                table_name: Transcode::from_wire(&wire.destination.output_id_template)?,
                ..Default::default()
            },
            shared: Transcode::from_wire(&wire.shared)?,
        })
    }
}

impl ExportPayload for MeasurementPayload {
    fn shared(&self) -> &wire::ExportShared {
        &self.shared
    }

    fn shared_mut(&mut self) -> &mut wire::ExportShared {
        &mut self.shared
    }

    fn destination_type(&self) -> &str {
        &self.destination.destination_type
    }
}

impl ExportResource for MeasurementExport {
    const DESTINATION_TYPE: &'static str = "iceberg";
    const DISPLAY_NAME: &'static str = "Measurement";

    fn shared(&self) -> &ExportShared {
        &self.shared
    }

    fn shared_mut(&mut self) -> &mut ExportShared {
        &mut self.shared
    }

    fn prepare_destination(&self, payload: &mut MeasurementPayload) {
        payload.destination.destination_type = Self::DESTINATION_TYPE.to_string();
        payload.hidden = true;

        if let Some(snapshot) = self.destination.snapshot_query() {
            payload.snapshot = Some(snapshot);
            payload.shared.partition_schema = wire::PartitionSchema {
                by: PartitionBy::Snapshot.as_str().to_string(),
                per: String::new(),
            };
        }
    }

    fn restore_destination(&mut self, payload: &MeasurementPayload) {
        if let Some(snapshot) = &payload.snapshot {
            self.destination.snapshot_table_id = Some(snapshot.snapshot_table_id.clone());
            self.destination.snapshot_source_id = Some(snapshot.source_id.clone());
            self.destination.snapshot_source_type = Some(snapshot.source_type.clone());
            self.shared.partition_schema = PartitionSchema {
                by: Some(PartitionBy::Snapshot),
                per: None,
            };
        }
    }
}
