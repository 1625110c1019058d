//! Workspaces
//!
//! Subscription-level entities. The API answers with loosely shaped JSON
//! (the id may come back as `id` or `workspaceId`), so responses are read as
//! [`serde_json::Value`] and picked apart here.

use serde_json::Value;

use crate::error::{FunnelError, Result};
use crate::funnel::FunnelClient;
use crate::mapping::model;
use crate::mapping::wire;
use crate::mapping::Transcode;

const WORKSPACES: &str = "workspaces";

/// List every workspace in the subscription
pub async fn list_workspaces(client: &FunnelClient) -> Result<Vec<model::Workspace>> {
    let list: Option<wire::WorkspaceList> = client.list_subscription_entities(WORKSPACES).await?;
    let list = list.unwrap_or_default();

    tracing::debug!("Found {} workspaces", list.data.len());

    Ok(Vec::<model::Workspace>::from_wire(&list.data)?)
}

/// Create a workspace. A 403 means the subscription's workspace limit is
/// reached and is returned as [`FunnelError::Forbidden`].
pub async fn create_workspace(
    client: &FunnelClient,
    workspace: &model::Workspace,
) -> Result<model::Workspace> {
    let payload = wire::Workspace {
        id: String::new(),
        name: workspace.name.to_wire()?,
    };

    let response: Value = client.create_subscription_entity(WORKSPACES, &payload).await?;
    let created = wire::Workspace::from_response(&response);
    if created.id.is_empty() {
        return Err(FunnelError::InvalidResponse(
            "workspace create response did not include an ID".to_string(),
        ));
    }

    tracing::info!("Created workspace {}", created.id);

    Ok(model::Workspace {
        id: Some(created.id),
        name: workspace.name.clone(),
    })
}

/// Read a workspace; `None` when it no longer exists
pub async fn read_workspace(client: &FunnelClient, id: &str) -> Result<Option<model::Workspace>> {
    let response: Option<Value> = client.get_subscription_entity(WORKSPACES, id).await?;

    response
        .map(|value| {
            let mut found = wire::Workspace::from_response(&value);
            if found.id.is_empty() {
                found.id = id.to_string();
            }
            model::Workspace::from_wire(&found)
        })
        .transpose()
        .map_err(FunnelError::from)
}

/// Rename a workspace. The id must be set.
pub async fn update_workspace(
    client: &FunnelClient,
    workspace: &model::Workspace,
) -> Result<model::Workspace> {
    let id = workspace
        .id
        .as_deref()
        .ok_or(FunnelError::MissingAttribute("id"))?;

    let payload = wire::Workspace {
        id: String::new(),
        name: workspace.name.to_wire()?,
    };
    let _: Value = client
        .update_subscription_entity(WORKSPACES, id, &payload)
        .await?;

    Ok(workspace.clone())
}

pub async fn delete_workspace(client: &FunnelClient, id: &str) -> Result<()> {
    client.delete_subscription_entity(WORKSPACES, id).await
}
