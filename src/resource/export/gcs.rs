//! Google Cloud Storage exports
//!
//! Files are always gzipped, and every run also writes a CSV summary and an
//! SQL schema file next to the data.

use serde::{Deserialize, Serialize};

use super::{ExportPayload, ExportResource};
use crate::mapping::model::ExportShared;
use crate::mapping::{wire, ConversionError, Transcode};

const SUMMARY_FILE_FORMAT: &str = "csv";
const SUMMARY_FILE_ID_TEMPLATE: &str = "{runId}/funnel_summary";
const SCHEMA_FILE_FORMAT: &str = "sql";
const SCHEMA_FILE_ID_TEMPLATE: &str = "{runId}/funnel_schema";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcsDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_id_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Ignored on write; the API always gzips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gzip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcsExport {
    pub destination: GcsDestination,
    #[serde(flatten)]
    pub shared: ExportShared,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GcsDestinationPayload {
    #[serde(rename = "type")]
    pub destination_type: String,
    pub output_id_template: String,
    pub path: String,
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gzip: Option<bool>,
    pub credentials_ref: String,
    pub summary_file_format: String,
    pub summary_file_id_template: String,
    pub schema_file_format: String,
    pub schema_file_id_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcsPayload {
    pub destination: GcsDestinationPayload,
    #[serde(flatten)]
    pub shared: wire::ExportShared,
}

impl Transcode for GcsExport {
    type Wire = GcsPayload;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        Ok(GcsPayload {
            destination: GcsDestinationPayload {
                output_id_template: self.destination.output_id_template.to_wire()?,
                path: self.destination.path.to_wire()?,
                bucket: self.destination.bucket.to_wire()?,
                gzip: self.destination.gzip.to_wire()?,
                credentials_ref: self.destination.credentials_ref.to_wire()?,
                ..Default::default()
            },
            shared: self.shared.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        Ok(Self {
            destination: GcsDestination {
                output_id_template: Transcode::from_wire(&wire.destination.output_id_template)?,
                path: Transcode::from_wire(&wire.destination.path)?,
                bucket: Transcode::from_wire(&wire.destination.bucket)?,
                gzip: Transcode::from_wire(&wire.destination.gzip)?,
                credentials_ref: Transcode::from_wire(&wire.destination.credentials_ref)?,
            },
            shared: Transcode::from_wire(&wire.shared)?,
        })
    }
}

impl ExportPayload for GcsPayload {
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

impl ExportResource for GcsExport {
    const DESTINATION_TYPE: &'static str = "gcs";
    const DISPLAY_NAME: &'static str = "GCS";

    fn shared(&self) -> &ExportShared {
        &self.shared
    }

    fn shared_mut(&mut self) -> &mut ExportShared {
        &mut self.shared
    }

    fn prepare_destination(&self, payload: &mut GcsPayload) {
        let destination = &mut payload.destination;
        destination.destination_type = Self::DESTINATION_TYPE.to_string();
        destination.gzip = Some(true);
        destination.summary_file_format = SUMMARY_FILE_FORMAT.to_string();
        destination.summary_file_id_template = SUMMARY_FILE_ID_TEMPLATE.to_string();
        destination.schema_file_format = SCHEMA_FILE_FORMAT.to_string();
        destination.schema_file_id_template = SCHEMA_FILE_ID_TEMPLATE.to_string();
    }

    fn reconcile(&mut self, response: &GcsPayload) {
        if let Some(gzip) = response.destination.gzip {
            self.destination.gzip = Some(gzip);
        }
    }
}
