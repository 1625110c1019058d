//! Funnel Client
//!
//! Main client for the control-plane API, combining authentication and HTTP
//! functionality. A client is built once from the provider settings and is
//! never mutated afterwards; every operation borrows it.

use super::auth::{fetch_access_token, AccessToken};
use super::http::FunnelHttpClient;
use crate::config::ProviderSettings;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Main Funnel client
#[derive(Clone, Debug)]
pub struct FunnelClient {
    http: FunnelHttpClient,
    base_url: String,
    subscription_id: String,
    token: AccessToken,
}

impl FunnelClient {
    /// Authenticate and create a client for the configured subscription
    pub async fn connect(settings: &ProviderSettings) -> Result<Self> {
        tracing::info!("Configuring Funnel client for environment {}", settings.environment);

        let http = FunnelHttpClient::new()?;
        let token = fetch_access_token(
            http.inner(),
            &settings.token_endpoint,
            &settings.audience,
            &settings.client_id,
            &settings.client_secret,
        )
        .await?;

        Ok(Self {
            http,
            base_url: settings.environment.api_base_url(),
            subscription_id: settings.subscription_id.clone(),
            token,
        })
    }

    /// Create a client from an already issued token
    pub fn with_token(base_url: &str, subscription_id: &str, token: AccessToken) -> Result<Self> {
        Ok(Self {
            http: FunnelHttpClient::new()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            subscription_id: subscription_id.to_string(),
            token,
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build subscription-level collection URL
    pub fn subscription_url(&self, entity: &str) -> String {
        format!(
            "{}/subscriptions/{}/{}",
            self.base_url,
            urlencoding::encode(&self.subscription_id),
            entity
        )
    }

    /// Build subscription-level entity URL
    pub fn subscription_entity_url(&self, entity: &str, id: &str) -> String {
        format!("{}/{}", self.subscription_url(entity), urlencoding::encode(id))
    }

    /// Build workspace-level collection URL
    pub fn workspace_url(&self, workspace: &str, entity: &str) -> String {
        self.subscription_url(&format!(
            "workspaces/{}/{}",
            urlencoding::encode(workspace),
            entity
        ))
    }

    /// Build workspace-level entity URL
    pub fn workspace_entity_url(&self, workspace: &str, entity: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.workspace_url(workspace, entity),
            urlencoding::encode(id)
        )
    }

    // =========================================================================
    // Subscription entities
    // =========================================================================

    /// List a subscription-level collection. `None` when the collection is missing.
    pub async fn list_subscription_entities<T: DeserializeOwned>(
        &self,
        entity: &str,
    ) -> Result<Option<T>> {
        self.http
            .get(&self.subscription_url(entity), self.token.as_str())
            .await
    }

    pub async fn get_subscription_entity<T: DeserializeOwned>(
        &self,
        entity: &str,
        id: &str,
    ) -> Result<Option<T>> {
        self.http
            .get(&self.subscription_entity_url(entity, id), self.token.as_str())
            .await
    }

    pub async fn create_subscription_entity<B, T>(&self, entity: &str, data: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::info!("Creating {}", entity);
        self.http
            .post(&self.subscription_url(entity), self.token.as_str(), data)
            .await
    }

    pub async fn update_subscription_entity<B, T>(&self, entity: &str, id: &str, data: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::info!("Updating {} {}", entity, id);
        self.http
            .put(&self.subscription_entity_url(entity, id), self.token.as_str(), data)
            .await
    }

    pub async fn delete_subscription_entity(&self, entity: &str, id: &str) -> Result<()> {
        tracing::info!("Deleting {} {}", entity, id);
        self.http
            .delete(&self.subscription_entity_url(entity, id), self.token.as_str())
            .await
    }

    // =========================================================================
    // Workspace entities
    // =========================================================================

    pub async fn get_workspace_entity<T: DeserializeOwned>(
        &self,
        workspace: &str,
        entity: &str,
        id: &str,
    ) -> Result<Option<T>> {
        self.http
            .get(
                &self.workspace_entity_url(workspace, entity, id),
                self.token.as_str(),
            )
            .await
    }

    pub async fn create_workspace_entity<B, T>(&self, workspace: &str, entity: &str, data: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::info!("Creating {} in workspace {}", entity, workspace);
        self.http
            .post(&self.workspace_url(workspace, entity), self.token.as_str(), data)
            .await
    }

    pub async fn update_workspace_entity<B, T>(
        &self,
        workspace: &str,
        entity: &str,
        id: &str,
        data: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::info!("Updating {} {} in workspace {}", entity, id, workspace);
        self.http
            .put(
                &self.workspace_entity_url(workspace, entity, id),
                self.token.as_str(),
                data,
            )
            .await
    }

    pub async fn delete_workspace_entity(&self, workspace: &str, entity: &str, id: &str) -> Result<()> {
        tracing::info!("Deleting {} {} in workspace {}", entity, id, workspace);
        self.http
            .delete(
                &self.workspace_entity_url(workspace, entity, id),
                self.token.as_str(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FunnelClient {
        FunnelClient::with_token(
            "https://controlplane.setup.us.funnel.io/v1/",
            "fs123",
            AccessToken::new("t"),
        )
        .unwrap()
    }

    #[test]
    fn test_subscription_urls() {
        let client = client();
        assert_eq!(
            client.subscription_url("workspaces"),
            "https://controlplane.setup.us.funnel.io/v1/subscriptions/fs123/workspaces"
        );
        assert_eq!(
            client.subscription_entity_url("workspaces", "ws-1"),
            "https://controlplane.setup.us.funnel.io/v1/subscriptions/fs123/workspaces/ws-1"
        );
    }

    #[test]
    fn test_workspace_urls() {
        let client = client();
        assert_eq!(
            client.workspace_entity_url("ws-1", "exports", "exp 1"),
            "https://controlplane.setup.us.funnel.io/v1/subscriptions/fs123/workspaces/ws-1/exports/exp%201"
        );
    }
}
