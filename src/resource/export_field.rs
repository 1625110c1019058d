//! Export field lookup
//!
//! Reads a field definition from a workspace so it can be dropped straight
//! into an export's `fields` list.

use crate::error::{FunnelError, Result};
use crate::funnel::FunnelClient;
use crate::mapping::model;
use crate::mapping::wire;
use crate::mapping::Transcode;

const FIELDS: &str = "fields";

/// Look up field `id` in `workspace`.
///
/// `export_name` falls back to the field's display name and `export_type` to
/// the type the API suggests. A missing field is [`FunnelError::NotFound`].
pub async fn get_export_field(
    client: &FunnelClient,
    workspace: &str,
    id: &str,
    export_name: Option<&str>,
    export_type: Option<&str>,
) -> Result<model::Field> {
    let response: Option<wire::Field> = client.get_workspace_entity(workspace, FIELDS, id).await?;
    let found = response.ok_or(FunnelError::NotFound)?;

    Ok(with_overrides(
        model::Field::from_wire(&found)?,
        workspace,
        export_name,
        export_type,
    ))
}

fn with_overrides(
    field: model::Field,
    workspace: &str,
    export_name: Option<&str>,
    export_type: Option<&str>,
) -> model::Field {
    let export_name = export_name
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| field.name.clone());
    let export_type = export_type
        .filter(|kind| !kind.is_empty())
        .map(str::to_string)
        .or_else(|| field.export_type.clone());

    model::Field {
        workspace: Some(workspace.to_string()),
        export_name,
        export_type,
        ..field
    }
}
