//! deploy::manifest
//!
//! The manifest capability surface and a typed Kubernetes `Deployment`.
//!
//! # Design
//!
//! [`DeploymentManifest`] exposes only the fields the rollout touches, so the
//! mutator works against any representation a cluster client hands out.
//! [`Deployment`] is the `apps/v1` JSON shape; fields it does not model are
//! kept verbatim in `extra` maps and written back unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from manifest handling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// The manifest has no container to point at the image.
    #[error("deployment '{name}' has no containers")]
    EmptyContainerList {
        /// Deployment name at the time of the check
        name: String,
    },

    /// The manifest document could not be decoded.
    #[error("invalid deployment manifest: {message}")]
    Parse {
        /// Decoder detail
        message: String,
    },

    /// The manifest could not be encoded.
    #[error("cannot encode deployment manifest: {message}")]
    Encode {
        /// Encoder detail
        message: String,
    },
}

/// Accessors the rollout needs on a deployment manifest.
pub trait DeploymentManifest {
    /// The deployment's name.
    fn name(&self) -> &str;
    /// Set the deployment's name.
    fn set_name(&mut self, name: &str);
    /// Set a label on the pod template.
    fn set_label(&mut self, key: &str, value: &str);
    /// Set how many old revisions the cluster retains.
    fn set_revision_history_limit(&mut self, limit: u32);
    /// Number of container specs, in order.
    fn container_count(&self) -> usize;
    /// Set the image of the container at `index`. Out-of-range is a no-op.
    fn set_container_image(&mut self, index: usize, image: &str);
}

/// A Kubernetes `apps/v1` Deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Deployment spec
    #[serde(default)]
    pub spec: DeploymentSpec,
    /// `apiVersion`, `kind`, `status`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Object metadata (name and labels).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deployment spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_history_limit: Option<u32>,
    #[serde(default)]
    pub template: PodTemplateSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pod template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pod spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A container spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Deployment {
    /// Decode a deployment from JSON (as printed by `kubectl get -o json`).
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::Parse {
            message: e.to_string(),
        })
    }

    /// Encode the deployment as pretty JSON.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        serde_json::to_string_pretty(self).map_err(|e| ManifestError::Encode {
            message: e.to_string(),
        })
    }

    /// Image of each container, in order.
    pub fn images(&self) -> Vec<Option<&str>> {
        self.spec
            .template
            .spec
            .containers
            .iter()
            .map(|c| c.image.as_deref())
            .collect()
    }
}

impl DeploymentManifest for Deployment {
    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("")
    }

    fn set_name(&mut self, name: &str) {
        self.metadata.name = Some(name.to_string());
    }

    fn set_label(&mut self, key: &str, value: &str) {
        self.spec
            .template
            .metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
    }

    fn set_revision_history_limit(&mut self, limit: u32) {
        self.spec.revision_history_limit = Some(limit);
    }

    fn container_count(&self) -> usize {
        self.spec.template.spec.containers.len()
    }

    fn set_container_image(&mut self, index: usize, image: &str) {
        if let Some(container) = self.spec.template.spec.containers.get_mut(index) {
            container.image = Some(image.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {"name": "api", "namespace": "prod", "uid": "1234"},
        "spec": {
            "replicas": 3,
            "revisionHistoryLimit": 10,
            "template": {
                "metadata": {"labels": {"name": "api", "tier": "backend"}},
                "spec": {
                    "containers": [
                        {"name": "api", "image": "r.io/api:old", "ports": [{"containerPort": 80}]},
                        {"name": "sidecar", "image": "r.io/proxy:1"}
                    ],
                    "restartPolicy": "Always"
                }
            }
        },
        "status": {"replicas": 3}
    }"#;

    #[test]
    fn decodes_modeled_fields() {
        let d = Deployment::from_json(SAMPLE).unwrap();
        assert_eq!(d.name(), "api");
        assert_eq!(d.spec.revision_history_limit, Some(10));
        assert_eq!(d.container_count(), 2);
        assert_eq!(d.images(), vec![Some("r.io/api:old"), Some("r.io/proxy:1")]);
    }

    #[test]
    fn unmodeled_fields_survive_round_trip() {
        let d = Deployment::from_json(SAMPLE).unwrap();
        let reencoded: Value = serde_json::from_str(&d.to_json().unwrap()).unwrap();
        let original: Value = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(reencoded, original);
    }

    #[test]
    fn set_label_creates_map() {
        let mut d = Deployment::from_json(r#"{"spec": {"template": {}}}"#).unwrap();
        d.set_label("name", "api");
        let value: Value = serde_json::from_str(&d.to_json().unwrap()).unwrap();
        assert_eq!(value["spec"]["template"]["metadata"]["labels"], json!({"name": "api"}));
    }

    #[test]
    fn set_container_image_out_of_range_is_noop() {
        let mut d = Deployment::from_json(SAMPLE).unwrap();
        let before = d.clone();
        d.set_container_image(5, "r.io/api:new");
        assert_eq!(d, before);
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(
            Deployment::from_json("not json"),
            Err(ManifestError::Parse { .. })
        ));
    }
}
