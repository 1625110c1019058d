//! Configuration Management
//!
//! Provider settings come from a YAML (or JSON) file, then `FUNNEL_*`
//! environment variables, then command-line flags, each layer overriding the
//! previous one. The resolved [`ProviderSettings`] are read-only from then on.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_ENVIRONMENT: &str = "us";

/// Funnel environment. Anything that is not a known name is taken as a
/// custom control-plane base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Us,
    Eu,
    Stage,
    Dev,
    Custom(String),
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value {
            "us" => Environment::Us,
            "eu" => Environment::Eu,
            "stage" => Environment::Stage,
            "dev" => Environment::Dev,
            other => Environment::Custom(other.trim_end_matches('/').to_string()),
        }
    }

    /// Control-plane API root, without a trailing slash
    pub fn api_base_url(&self) -> String {
        match self {
            Environment::Us => "https://controlplane.setup.us.funnel.io/v1".to_string(),
            Environment::Eu => "https://controlplane.setup.eu.funnel.io/v1".to_string(),
            Environment::Stage => "https://controlplane.setup.stage.funnel.io/v1".to_string(),
            Environment::Dev => "http://localhost:3000/v1".to_string(),
            Environment::Custom(url) => url.clone(),
        }
    }

    /// OAuth token endpoint. US and EU share one tenant.
    pub fn token_endpoint(&self) -> &'static str {
        match self {
            Environment::Us | Environment::Eu => "https://funnel.us.auth0.com/oauth/token",
            _ => "https://funnel-dev.eu.auth0.com/oauth/token",
        }
    }

    pub fn audience(&self) -> &'static str {
        match self {
            Environment::Us => "https://controlplane.setup.us.funnel.io",
            Environment::Eu => "https://controlplane.setup.eu.funnel.io",
            _ => "https://controlplane.setup.stage.funnel.io",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Us => f.write_str("us"),
            Environment::Eu => f.write_str("eu"),
            Environment::Stage => f.write_str("stage"),
            Environment::Dev => f.write_str("dev"),
            Environment::Custom(url) => f.write_str(url),
        }
    }
}

/// User configuration as written on disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// `us`, `eu`, `stage`, `dev` or a custom URL. Defaults to `us`.
    #[serde(default)]
    pub environment: Option<String>,
    /// Subscription ID, e.g. `fsXXXXXXXXXXX`
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Overrides the environment's token endpoint
    #[serde(default)]
    pub token_endpoint: Option<String>,
    /// Overrides the environment's token audience
    #[serde(default)]
    pub audience: Option<String>,
}

/// Fully resolved provider settings
#[derive(Clone)]
pub struct ProviderSettings {
    pub environment: Environment,
    pub subscription_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub token_endpoint: String,
    pub audience: String,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("environment", &self.environment)
            .field("subscription_id", &self.subscription_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_endpoint", &self.token_endpoint)
            .field("audience", &self.audience)
            .finish()
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("funnelctl").join("config.yaml"))
    }

    /// Load configuration from disk.
    ///
    /// An explicit path must exist; a missing default file yields an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse YAML or JSON configuration text
    pub fn parse(content: &str) -> Result<Self> {
        // JSON is a subset of YAML
        serde_yaml::from_str(content).context("Invalid configuration")
    }

    /// Apply `FUNNEL_*` environment variables on top of file values
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let slots: [(&str, &mut Option<String>); 4] = [
            ("FUNNEL_ENVIRONMENT", &mut self.environment),
            ("FUNNEL_SUBSCRIPTION_ID", &mut self.subscription_id),
            ("FUNNEL_CLIENT_ID", &mut self.client_id),
            ("FUNNEL_CLIENT_SECRET", &mut self.client_secret),
        ];

        for (key, slot) in slots {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }

        self
    }

    /// Resolve the effective settings, failing on missing required values
    pub fn resolve(&self) -> Result<ProviderSettings> {
        let environment = Environment::parse(
            self.environment
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or(DEFAULT_ENVIRONMENT),
        );

        if let Environment::Custom(base_url) = &environment {
            url::Url::parse(base_url)
                .with_context(|| format!("Unknown environment or invalid URL: {}", base_url))?;
        }

        let subscription_id = required(&self.subscription_id, "subscription_id")?;
        let client_id = required(&self.client_id, "client_id")?;
        let client_secret = required(&self.client_secret, "client_secret")?;

        Ok(ProviderSettings {
            token_endpoint: self
                .token_endpoint
                .clone()
                .unwrap_or_else(|| environment.token_endpoint().to_string()),
            audience: self
                .audience
                .clone()
                .unwrap_or_else(|| environment.audience().to_string()),
            environment,
            subscription_id,
            client_id,
            client_secret,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing required configuration value: {}", name))
}
