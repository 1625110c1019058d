//! BigQuery exports
//!
//! Always written as a single table.

use serde::{Deserialize, Serialize};

use super::{ExportPayload, ExportResource};
use crate::mapping::model::ExportShared;
use crate::mapping::{wire, ConversionError, Transcode};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigQueryDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_id_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BigQueryExport {
    pub destination: BigQueryDestination,
    #[serde(flatten)]
    pub shared: ExportShared,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BigQueryDestinationPayload {
    #[serde(rename = "type")]
    pub destination_type: String,
    pub output_id_template: String,
    pub dataset_id: String,
    pub project_id: String,
    pub single_table: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigQueryPayload {
    pub destination: BigQueryDestinationPayload,
    #[serde(flatten)]
    pub shared: wire::ExportShared,
}

impl Transcode for BigQueryExport {
    type Wire = BigQueryPayload;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(BigQueryPayload {
            destination: BigQueryDestinationPayload {
                output_id_template: self.destination.output_id_template.to_wire()?,
                dataset_id: self.destination.dataset_id.to_wire()?,
                project_id: self.destination.project_id.to_wire()?,
                ..Default::default()
            },
            shared: self.shared.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            destination: BigQueryDestination {
                output_id_template: Transcode::from_wire(&wire.destination.output_id_template)?,
                dataset_id: Transcode::from_wire(&wire.destination.dataset_id)?,
                project_id: Transcode::from_wire(&wire.destination.project_id)?,
            },
            shared: Transcode::from_wire(&wire.shared)?,
        })
    }
}

impl ExportPayload for BigQueryPayload {
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

impl ExportResource for BigQueryExport {
    const DESTINATION_TYPE: &'static str = "bigquery";
    const DISPLAY_NAME: &'static str = "BigQuery";

    fn shared(&self) -> &ExportShared {
        &self.shared
    }

    fn shared_mut(&mut self) -> &mut ExportShared {
        &mut self.shared
    }

    fn prepare_destination(&self, payload: &mut BigQueryPayload) {
        payload.destination.destination_type = Self::DESTINATION_TYPE.to_string();
        payload.destination.single_table = true;
    }
}
