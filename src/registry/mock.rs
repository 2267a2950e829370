//! registry::mock
//!
//! Mock registry for deterministic testing.
//!
//! # Example
//!
//! ```
//! use kubedeploy::credentials::Credentials;
//! use kubedeploy::registry::mock::MockRegistry;
//! use kubedeploy::registry::Registry;
//!
//! # tokio_test::block_on(async {
//! let registry = MockRegistry::new().with_tags("app", &["abc12345", "latest"]);
//!
//! let session = registry
//!     .authenticate("r.io", &Credentials::new("alice", "secret"))
//!     .await
//!     .unwrap();
//! let tags = session.list_tags("app").await.unwrap();
//! assert!(tags.contains("abc12345"));
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{Registry, RegistryError, RegistrySession};
use crate::credentials::Credentials;

/// Mock registry for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    inner: Arc<Mutex<MockRegistryInner>>,
}

#[derive(Debug, Default)]
struct MockRegistryInner {
    /// Tags per repository.
    repositories: HashMap<String, HashSet<String>>,
    /// If set, only these credentials authenticate.
    accepted: Option<Credentials>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail authenticate with the given error.
    Authenticate(RegistryError),
    /// Fail list_tags with the given error.
    ListTags(RegistryError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Authenticate { domain: String, username: String },
    ListTags { repository: String },
}

impl MockRegistry {
    /// Create an empty mock registry that accepts any credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tags to a repository.
    pub fn with_tags(self, repository: &str, tags: &[&str]) -> Self {
        self.lock()
            .repositories
            .entry(repository.to_string())
            .or_default()
            .extend(tags.iter().map(|t| t.to_string()));
        self
    }

    /// Only accept the given credentials.
    pub fn accepting(self, username: &str, password: &str) -> Self {
        self.lock().accepted = Some(Credentials::new(username, password));
        self
    }

    /// Configure an operation to fail.
    pub fn fail_on(&self, fail_on: FailOn) {
        self.lock().fail_on = Some(fail_on);
    }

    /// Get the recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockRegistryInner> {
        self.inner.lock().expect("mock registry lock poisoned")
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn authenticate(
        &self,
        domain: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn RegistrySession>, RegistryError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Authenticate {
            domain: domain.to_string(),
            username: credentials.username.clone(),
        });

        if let Some(FailOn::Authenticate(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        if let Some(accepted) = &inner.accepted {
            if accepted != credentials {
                return Err(RegistryError::Auth {
                    domain: domain.to_string(),
                    message: "credentials rejected".into(),
                });
            }
        }

        Ok(Box::new(MockSession {
            registry: self.clone(),
        }))
    }
}

/// Session handed out by [`MockRegistry`].
#[derive(Debug)]
struct MockSession {
    registry: MockRegistry,
}

#[async_trait]
impl RegistrySession for MockSession {
    async fn list_tags(&self, repository: &str) -> Result<HashSet<String>, RegistryError> {
        let mut inner = self.registry.lock();
        inner.operations.push(MockOperation::ListTags {
            repository: repository.to_string(),
        });

        if let Some(FailOn::ListTags(err)) = &inner.fail_on {
            return Err(err.clone());
        }

        Ok(inner
            .repositories
            .get(repository)
            .cloned()
            .unwrap_or_default())
    }
}
