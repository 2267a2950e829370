//! platform::kubectl
//!
//! Deployment reads and applies through the `kubectl` CLI.

use tracing::info;

use super::{run, Cluster, Output, PlatformError};
use crate::deploy::{Deployment, DeploymentManifest};

/// Server-populated metadata that must not be sent back on apply.
const SERVER_METADATA: &[&str] = &[
    "creationTimestamp",
    "generation",
    "managedFields",
    "resourceVersion",
    "uid",
];

/// `kubectl` bound to one namespace.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
    namespace: String,
}

impl Kubectl {
    /// Use `kubectl` from `PATH` against `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            program: "kubectl".to_string(),
            namespace: namespace.into(),
        }
    }

    /// Use a specific binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The namespace commands run against.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn kubectl(&self, args: &[&str], stdin: Option<&str>) -> Result<String, PlatformError> {
        let mut full = vec!["--namespace", self.namespace.as_str()];
        full.extend_from_slice(args);
        run(&self.program, &full, None, stdin, Output::Capture)
    }
}

impl Cluster for Kubectl {
    fn info(&self) -> Result<String, PlatformError> {
        self.kubectl(&["get", "deployments", "-o", "wide"], None)
    }

    fn get_deployment(&self, name: &str) -> Result<Deployment, PlatformError> {
        let json = self.kubectl(&["get", "deployment", name, "-o", "json"], None)?;
        Ok(Deployment::from_json(&json)?)
    }

    fn apply_deployment(&self, deployment: &Deployment) -> Result<(), PlatformError> {
        info!(
            deployment = deployment.name(),
            namespace = %self.namespace,
            "applying deployment"
        );
        let manifest = for_apply(deployment).to_json()?;
        self.kubectl(&["apply", "-f", "-"], Some(&manifest))?;
        Ok(())
    }
}

/// Copy of `deployment` without status and server-owned metadata.
fn for_apply(deployment: &Deployment) -> Deployment {
    let mut clean = deployment.clone();
    clean.extra.remove("status");
    for key in SERVER_METADATA {
        clean.metadata.extra.remove(*key);
    }
    clean
}
