//! credentials
//!
//! Registry credential lookup.
//!
//! # Architecture
//!
//! Credentials are read through the [`CredentialStore`] trait, which has
//! multiple implementations:
//!
//! - [`DockerConfigStore`]: the docker CLI's `config.json` (default)
//! - [`EnvCredentialStore`]: `KUBEDEPLOY_REGISTRY_USERNAME` / `_PASSWORD`
//! - [`StaticCredentialStore`]: fixed in-memory credentials, for tests
//!
//! The registry probe only sees the trait, so other backends can be added
//! without touching it.
//!
//! # Security
//!
//! - Passwords are **never** logged or included in error messages
//! - Stores are read-only; lookups never modify the backing source
//!
//! # Provider Selection
//!
//! ```ignore
//! use kubedeploy::credentials::create_store;
//!
//! let store = create_store("docker-config", None)?;
//! let creds = store.lookup("registry.example.com")?;
//! ```

mod docker_config;
mod env_store;
mod traits;

use std::collections::HashMap;
use std::path::Path;

pub use docker_config::DockerConfigStore;
pub use env_store::{EnvCredentialStore, DEFAULT_ENV_PREFIX};
pub use traits::{CredentialError, CredentialStore, Credentials};

/// The default credential provider name.
pub const DEFAULT_PROVIDER: &str = "docker-config";

/// Names accepted by [`create_store`].
pub fn valid_provider_names() -> &'static [&'static str] {
    &["docker-config", "env"]
}

/// Create a credential store based on the provider name.
///
/// `path` overrides the file location for file-backed providers.
///
/// # Errors
///
/// - Unknown provider name
/// - Initialization errors from the store
pub fn create_store(
    provider: &str,
    path: Option<&Path>,
) -> Result<Box<dyn CredentialStore>, CredentialError> {
    match provider {
        "docker-config" => match path {
            Some(path) => Ok(Box::new(DockerConfigStore::with_path(path.to_path_buf()))),
            None => Ok(Box::new(DockerConfigStore::new()?)),
        },
        "env" => Ok(Box::new(EnvCredentialStore::new())),
        other => Err(CredentialError::ProviderNotAvailable(format!(
            "unknown credentials provider: '{}' (valid: {})",
            other,
            valid_provider_names().join(", ")
        ))),
    }
}

/// In-memory credentials keyed by domain.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    entries: HashMap<String, Credentials>,
}

impl StaticCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add credentials for a domain.
    pub fn with(mut self, domain: &str, username: &str, password: &str) -> Self {
        self.entries
            .insert(domain.to_string(), Credentials::new(username, password));
        self
    }
}

impl CredentialStore for StaticCredentialStore {
    fn lookup(&self, domain: &str) -> Result<Credentials, CredentialError> {
        self.entries
            .get(domain)
            .cloned()
            .ok_or_else(|| CredentialError::NoCredentialsForDomain {
                domain: domain.to_string(),
                source_name: "static store".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_docker_config_store_with_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"auths": {}}"#).unwrap();

        let store = create_store("docker-config", Some(&path)).expect("create store");
        assert!(matches!(
            store.lookup("r.io"),
            Err(CredentialError::NoCredentialsForDomain { .. })
        ));
    }

    #[test]
    fn create_env_store() {
        assert!(create_store("env", None).is_ok());
    }

    #[test]
    fn create_unknown_provider() {
        match create_store("vault", None) {
            Err(CredentialError::ProviderNotAvailable(msg)) => {
                assert!(msg.contains("vault"));
                assert!(msg.contains("docker-config"));
            }
            Err(e) => panic!("unexpected error type: {:?}", e),
            Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn default_provider_is_valid() {
        assert!(valid_provider_names().contains(&DEFAULT_PROVIDER));
    }

    #[test]
    fn static_store_lookup() {
        let store = StaticCredentialStore::new().with("r.io", "alice", "secret");
        assert_eq!(
            store.lookup("r.io").unwrap(),
            Credentials::new("alice", "secret")
        );
        assert!(store.lookup("other.io").is_err());
    }
}
