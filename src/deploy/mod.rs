//! deploy
//!
//! Deployment manifests and the mutation applied before a rollout.
//!
//! - [`DeploymentManifest`]: the fields a rollout touches
//! - [`Deployment`]: typed `apps/v1` Deployment, lossless for other fields
//! - [`apply`]: set name, label, history limit, and first container image

mod manifest;
mod mutator;

pub use manifest::{
    Container, Deployment, DeploymentManifest, DeploymentSpec, ManifestError, ObjectMeta,
    PodSpec, PodTemplateSpec,
};
pub use mutator::{apply, REVISION_HISTORY_LIMIT};

/// Name of the deployment for a service in an environment.
///
/// `api` in `staging` is deployed as `api-staging`; without an environment
/// the service name is used as is.
pub fn deployment_name(service: &str, environment: Option<&str>) -> String {
    match environment {
        Some(env) if !env.is_empty() => format!("{}-{}", service, env),
        _ => service.to_string(),
    }
}
