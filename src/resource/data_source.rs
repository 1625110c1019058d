//! Data sources
//!
//! Workspace-level `datasources` entities. A create answered with 409 means a
//! data source with the same configuration already exists; the error is
//! returned as [`FunnelError::Conflict`] with the API's details.

use crate::error::{FunnelError, Result};
use crate::funnel::FunnelClient;
use crate::mapping::model;
use crate::mapping::wire;
use crate::mapping::Transcode;

const DATA_SOURCES: &str = "datasources";

fn workspace_of(data_source: &model::DataSource) -> Result<&str> {
    data_source
        .workspace
        .as_deref()
        .ok_or(FunnelError::MissingAttribute("workspace"))
}

/// Create a data source and return it as the API stored it
pub async fn create_data_source(
    client: &FunnelClient,
    data_source: &model::DataSource,
) -> Result<model::DataSource> {
    let workspace = workspace_of(data_source)?;
    let payload = wire::DataSource {
        id: String::new(),
        ..data_source.to_wire()?
    };

    let response: wire::DataSource = client
        .create_workspace_entity(workspace, DATA_SOURCES, &payload)
        .await?;

    let mut created = model::DataSource::from_wire(&response)?;
    if created.workspace.is_none() {
        created.workspace = data_source.workspace.clone();
    }

    tracing::info!("Created data source {:?} in workspace {}", created.id, workspace);
    Ok(created)
}

/// Read a data source; `None` once it has been removed
pub async fn read_data_source(
    client: &FunnelClient,
    workspace: &str,
    id: &str,
) -> Result<Option<model::DataSource>> {
    let response: Option<wire::DataSource> = client
        .get_workspace_entity(workspace, DATA_SOURCES, id)
        .await?;

    response
        .map(|found| -> Result<model::DataSource> {
            let mut data_source = model::DataSource::from_wire(&found)?;
            data_source.id = Some(id.to_string());
            if data_source.workspace.is_none() {
                data_source.workspace = Some(workspace.to_string());
            }
            Ok(data_source)
        })
        .transpose()
}

pub async fn update_data_source(
    client: &FunnelClient,
    data_source: &model::DataSource,
) -> Result<model::DataSource> {
    let workspace = workspace_of(data_source)?;
    let id = data_source
        .id
        .as_deref()
        .ok_or(FunnelError::MissingAttribute("id"))?;

    let payload = data_source.to_wire()?;
    let _: serde_json::Value = client
        .update_workspace_entity(workspace, DATA_SOURCES, id, &payload)
        .await?;

    Ok(data_source.clone())
}

pub async fn delete_data_source(client: &FunnelClient, workspace: &str, id: &str) -> Result<()> {
    client
        .delete_workspace_entity(workspace, DATA_SOURCES, id)
        .await
}
