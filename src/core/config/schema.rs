//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$KUBEDEPLOY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/kubedeploy/config.toml`
//! 3. `~/.kubedeploy/config.toml`
//!
//! # Service Config
//!
//! Located at `.kubedeploy.toml` in the directory the command runs in.
//!
//! # Validation
//!
//! Values are validated after parsing: the registry must be a bare domain,
//! the default branch must be a valid branch name, timeouts must be non-zero.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// registry = "registry.example.com"
///
/// [credentials]
/// provider = "docker-config"
///
/// [network]
/// fetch_timeout_secs = 60
/// registry_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default registry domain
    pub registry: Option<String>,

    /// Where registry credentials come from
    pub credentials: Option<CredentialsConfig>,

    /// Network deadlines
    pub network: Option<NetworkConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(registry) = &self.registry {
            validate_registry(registry)?;
        }
        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }
        if let Some(network) = &self.network {
            network.validate()?;
        }
        Ok(())
    }
}

/// Service configuration, read from `.kubedeploy.toml`.
///
/// # Example
///
/// ```toml
/// registry = "registry.example.com"
/// image = "team/api"
/// namespace = "production"
/// service_name = "api"
/// branch = "main"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Registry domain (overrides global)
    pub registry: Option<String>,

    /// Image repository name within the registry
    pub image: Option<String>,

    /// Kubernetes namespace (default: "default")
    pub namespace: Option<String>,

    /// Service name (default: the directory name)
    pub service_name: Option<String>,

    /// Branch to deploy when none is given on the command line
    pub branch: Option<String>,

    /// Environment suffix for the deployment name
    pub environment: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(registry) = &self.registry {
            validate_registry(registry)?;
        }
        if let Some(branch) = &self.branch {
            BranchName::new(branch.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("branch: {}", e)))?;
        }
        if let Some(image) = &self.image {
            if image.is_empty() || image.contains(':') {
                return Err(ConfigError::InvalidValue(format!(
                    "image '{}' must be a non-empty repository name without ':'",
                    image
                )));
            }
        }
        for (key, value) in [
            ("namespace", &self.namespace),
            ("service_name", &self.service_name),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{} cannot be empty", key)));
            }
        }
        Ok(())
    }
}

/// Credential source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Provider name: "docker-config" (default) or "env"
    pub provider: Option<String>,

    /// Explicit path to a docker-style `config.json`
    pub path: Option<PathBuf>,
}

impl CredentialsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            let valid = crate::credentials::valid_provider_names();
            if !valid.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid credentials provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Network deadlines, in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Upper bound for each `git fetch` of a remote
    pub fetch_timeout_secs: Option<u64>,

    /// Upper bound for each registry request
    pub registry_timeout_secs: Option<u64>,
}

impl NetworkConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_secs == Some(0) || self.registry_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "network timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn validate_registry(registry: &str) -> Result<(), ConfigError> {
    if registry.is_empty() || registry.contains('/') {
        return Err(ConfigError::InvalidValue(format!(
            "registry '{}' must be a bare domain (no scheme or path)",
            registry
        )));
    }
    Ok(())
}
