//! registry::probe
//!
//! Check whether an image tag exists in its registry.
//!
//! The probe reads credentials for the tag's domain, opens a session, lists
//! the repository's tags, and tests membership of the version. It is
//! read-only; every failure is returned to the caller without retry.

use tracing::{debug, info};

use super::traits::{Registry, RegistryError};
use crate::core::tag::Tag;
use crate::credentials::CredentialStore;

/// Tag existence check backed by a credential store and a registry.
pub struct RegistryProbe {
    store: Box<dyn CredentialStore>,
    registry: Box<dyn Registry>,
}

impl RegistryProbe {
    /// Create a probe.
    pub fn new(store: Box<dyn CredentialStore>, registry: Box<dyn Registry>) -> Self {
        Self { store, registry }
    }

    /// Whether `tag.version` is among the tags of `tag.repository` on `tag.domain`.
    ///
    /// Returns `Ok(false)` when the repository exists without the tag, or has
    /// no tags at all.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Credentials`] if no usable credentials exist
    /// - [`RegistryError::Auth`] if the registry rejects them
    /// - [`RegistryError::Unavailable`] on transport failure
    pub async fn exists(&self, tag: &Tag) -> Result<bool, RegistryError> {
        let credentials = self.store.lookup(&tag.domain)?;
        debug!(domain = %tag.domain, username = %credentials.username, "authenticating");

        let session = self.registry.authenticate(&tag.domain, &credentials).await?;
        let tags = session.list_tags(&tag.repository).await?;

        let found = tags.contains(&tag.version);
        info!(tag = %tag, found, "probed registry");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialError, StaticCredentialStore};
    use crate::registry::mock::{FailOn, MockOperation, MockRegistry};

    fn tag(version: &str) -> Tag {
        Tag::new("r.io", "app", version)
    }

    fn probe_with(registry: &MockRegistry) -> RegistryProbe {
        let store = StaticCredentialStore::new().with("r.io", "alice", "secret");
        RegistryProbe::new(Box::new(store), Box::new(registry.clone()))
    }

    #[tokio::test]
    async fn present_tag() {
        let registry = MockRegistry::new().with_tags("app", &["abc12345", "latest"]);
        assert!(probe_with(&registry).exists(&tag("abc12345")).await.unwrap());
    }

    #[tokio::test]
    async fn absent_tag_is_false() {
        let registry = MockRegistry::new().with_tags("app", &["latest"]);
        assert!(!probe_with(&registry).exists(&tag("abc12345")).await.unwrap());
    }

    #[tokio::test]
    async fn tag_membership_is_exact() {
        let registry = MockRegistry::new().with_tags("app", &["abc123456"]);
        assert!(!probe_with(&registry).exists(&tag("abc12345")).await.unwrap());
    }

    #[tokio::test]
    async fn uses_credentials_for_tag_domain() {
        let registry = MockRegistry::new()
            .accepting("alice", "secret")
            .with_tags("app", &["v1"]);
        let probe = probe_with(&registry);

        assert!(probe.exists(&tag("v1")).await.unwrap());
        assert_eq!(
            registry.operations()[0],
            MockOperation::Authenticate {
                domain: "r.io".into(),
                username: "alice".into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_credentials() {
        let registry = MockRegistry::new();
        let probe = probe_with(&registry);

        let err = probe
            .exists(&Tag::new("other.io", "app", "v1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Credentials(CredentialError::NoCredentialsForDomain { .. })
        ));
        assert!(registry.operations().is_empty());
    }

    #[tokio::test]
    async fn auth_failure_propagates() {
        let registry = MockRegistry::new().accepting("alice", "different");
        let err = probe_with(&registry).exists(&tag("v1")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Auth { .. }));
    }

    #[tokio::test]
    async fn unavailable_propagates() {
        let registry = MockRegistry::new();
        registry.fail_on(FailOn::ListTags(RegistryError::Unavailable {
            domain: "r.io".into(),
            message: "503".into(),
        }));
        let err = probe_with(&registry).exists(&tag("v1")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable { .. }));
    }
}
