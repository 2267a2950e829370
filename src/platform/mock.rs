//! platform::mock
//!
//! Recording doubles for [`ImageBuilder`] and [`Cluster`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{Cluster, ImageBuilder, PlatformError};
use crate::deploy::{Deployment, DeploymentManifest};

/// Recorded platform operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Build { tag: String },
    Push { tag: String },
    Info,
    GetDeployment { name: String },
    Apply { name: String },
}

/// In-memory builder and cluster. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockPlatform {
    inner: Arc<Mutex<MockPlatformInner>>,
}

#[derive(Debug, Default)]
struct MockPlatformInner {
    deployments: HashMap<String, Deployment>,
    applied: Vec<Deployment>,
    operations: Vec<MockOperation>,
    fail_push: bool,
}

impl MockPlatform {
    /// Create an empty platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live deployment, keyed by its name.
    pub fn with_deployment(self, deployment: Deployment) -> Self {
        let name = deployment.name().to_string();
        self.lock().deployments.insert(name, deployment);
        self
    }

    /// Make every push fail.
    pub fn failing_push(self) -> Self {
        self.lock().fail_push = true;
        self
    }

    /// Deployments passed to `apply_deployment`, in order.
    pub fn applied(&self) -> Vec<Deployment> {
        self.lock().applied.clone()
    }

    /// Get the recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockPlatformInner> {
        self.inner.lock().expect("mock platform lock poisoned")
    }
}

impl ImageBuilder for MockPlatform {
    fn build(&self, _context_dir: &Path, tag: &str) -> Result<(), PlatformError> {
        self.lock().operations.push(MockOperation::Build {
            tag: tag.to_string(),
        });
        Ok(())
    }

    fn push(&self, tag: &str) -> Result<(), PlatformError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Push {
            tag: tag.to_string(),
        });
        if inner.fail_push {
            return Err(PlatformError::CommandFailed {
                command: format!("docker push {}", tag),
                message: "denied".into(),
            });
        }
        Ok(())
    }
}

impl Cluster for MockPlatform {
    fn info(&self) -> Result<String, PlatformError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Info);
        let mut names: Vec<_> = inner.deployments.keys().cloned().collect();
        names.sort();
        Ok(names.join("\n"))
    }

    fn get_deployment(&self, name: &str) -> Result<Deployment, PlatformError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::GetDeployment {
            name: name.to_string(),
        });
        inner
            .deployments
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformError::CommandFailed {
                command: format!("kubectl get deployment {}", name),
                message: format!("deployments.apps \"{}\" not found", name),
            })
    }

    fn apply_deployment(&self, deployment: &Deployment) -> Result<(), PlatformError> {
        let mut inner = self.lock();
        inner.operations.push(MockOperation::Apply {
            name: deployment.name().to_string(),
        });
        inner.applied.push(deployment.clone());
        inner
            .deployments
            .insert(deployment.name().to_string(), deployment.clone());
        Ok(())
    }
}
