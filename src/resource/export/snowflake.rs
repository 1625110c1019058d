//! Snowflake exports

use serde::{Deserialize, Serialize};

use super::{ExportPayload, ExportResource};
use crate::mapping::model::ExportShared;
use crate::mapping::{wire, ConversionError, Transcode};

const DESTINATION_VERSION: &str = "V2";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowflakeDestination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_access_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnowflakeExport {
    pub destination: SnowflakeDestination,
    #[serde(flatten)]
    pub shared: ExportShared,
}

/// The personal access token travels as `password`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnowflakeDestinationPayload {
    #[serde(rename = "type")]
    pub destination_type: String,
    pub account_locator: String,
    pub table_name: String,
    pub database: String,
    pub schema_name: String,
    pub username: String,
    #[serde(rename = "password")]
    pub personal_access_token: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowflakePayload {
    pub destination: SnowflakeDestinationPayload,
    #[serde(flatten)]
    pub shared: wire::ExportShared,
}

impl Transcode for SnowflakeExport {
    type Wire = SnowflakePayload;

    fn to_wire(&self) -> Result<Self::Wire, ConversionError> {
        let destination = &self.destination;
        Ok(SnowflakePayload {
            destination: SnowflakeDestinationPayload {
                account_locator: destination.account_locator.to_wire()?,
                table_name: destination.table_name.to_wire()?,
                database: destination.database.to_wire()?,
                schema_name: destination.schema_name.to_wire()?,
                username: destination.username.to_wire()?,
                personal_access_token: destination.personal_access_token.to_wire()?,
                ..Default::default()
            },
            shared: self.shared.to_wire()?,
        })
    }

    fn from_wire(wire: &Self::Wire) -> Result<Self, ConversionError> {
        let destination = &wire.destination;
        Ok(Self {
            destination: SnowflakeDestination {
                account_locator: Transcode::from_wire(&destination.account_locator)?,
                table_name: Transcode::from_wire(&destination.table_name)?,
                database: Transcode::from_wire(&destination.database)?,
                schema_name: Transcode::from_wire(&destination.schema_name)?,
                username: Transcode::from_wire(&destination.username)?,
                personal_access_token: Transcode::from_wire(&destination.personal_access_token)?,
            },
            shared: Transcode::from_wire(&wire.shared)?,
        })
    }
}

impl ExportPayload for SnowflakePayload {
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

impl ExportResource for SnowflakeExport {
    const DESTINATION_TYPE: &'static str = "snowflake";
    const DISPLAY_NAME: &'static str = "Snowflake";

    fn shared(&self) -> &ExportShared {
        &self.shared
    }

    fn shared_mut(&mut self) -> &mut ExportShared {
        &mut self.shared
    }

    fn prepare_destination(&self, payload: &mut SnowflakePayload) {
        payload.destination.destination_type = Self::DESTINATION_TYPE.to_string();
        payload.destination.version = DESTINATION_VERSION.to_string();
    }
}
