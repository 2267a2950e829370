//! deploy::mutator
//!
//! Point a deployment manifest at a new image.

use tracing::debug;

use super::manifest::{DeploymentManifest, ManifestError};

/// Old ReplicaSets the cluster keeps for rollback.
pub const REVISION_HISTORY_LIMIT: u32 = 5;

/// Mutate `manifest` in place for rolling out `tag` as `deployment_name`.
///
/// Sets the name, the pod template's `name` label, the revision history
/// limit, and the image of the **first** container. Other containers are
/// left as they are.
///
/// # Errors
///
/// Returns [`ManifestError::EmptyContainerList`] if the manifest has no
/// containers. The manifest is not touched in that case.
pub fn apply<'m, M>(
    manifest: &'m mut M,
    tag: &str,
    deployment_name: &str,
) -> Result<&'m mut M, ManifestError>
where
    M: DeploymentManifest + ?Sized,
{
    if manifest.container_count() == 0 {
        return Err(ManifestError::EmptyContainerList {
            name: manifest.name().to_string(),
        });
    }

    debug!(deployment = deployment_name, tag, "updating deployment manifest");
    manifest.set_name(deployment_name);
    manifest.set_label("name", deployment_name);
    manifest.set_revision_history_limit(REVISION_HISTORY_LIMIT);
    // TODO: multi-container pods need a way to say which container gets the image
    manifest.set_container_image(0, tag);

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::manifest::Deployment;
    use serde_json::{json, Value};

    fn deployment(value: Value) -> Deployment {
        Deployment::from_json(&value.to_string()).unwrap()
    }

    fn single_container() -> Deployment {
        deployment(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "old", "namespace": "default"},
            "spec": {
                "replicas": 2,
                "template": {
                    "metadata": {"labels": {"app": "api"}},
                    "spec": {"containers": [{"name": "api", "image": "r.io/api:old"}]}
                }
            }
        }))
    }

    #[test]
    fn sets_image_name_label_and_history() {
        let mut d = single_container();
        apply(&mut d, "r.io/api:abc12345", "api-staging").unwrap();

        assert_eq!(d.name(), "api-staging");
        assert_eq!(d.images(), vec![Some("r.io/api:abc12345")]);
        assert_eq!(d.spec.revision_history_limit, Some(REVISION_HISTORY_LIMIT));
        let labels = d.spec.template.metadata.labels.as_ref().unwrap();
        assert_eq!(labels.get("name").map(String::as_str), Some("api-staging"));
    }

    #[test]
    fn leaves_other_fields_untouched() {
        let original = single_container();
        let mut d = original.clone();
        apply(&mut d, "r.io/api:abc12345", "api").unwrap();

        let mut before: Value = serde_json::from_str(&original.to_json().unwrap()).unwrap();
        let after: Value = serde_json::from_str(&d.to_json().unwrap()).unwrap();

        before["metadata"]["name"] = json!("api");
        before["spec"]["revisionHistoryLimit"] = json!(5);
        before["spec"]["template"]["metadata"]["labels"]["name"] = json!("api");
        before["spec"]["template"]["spec"]["containers"][0]["image"] = json!("r.io/api:abc12345");
        assert_eq!(after, before);
    }

    #[test]
    fn only_first_container_updated() {
        let mut d = deployment(json!({
            "metadata": {"name": "api"},
            "spec": {"template": {"spec": {"containers": [
                {"name": "api", "image": "r.io/api:old"},
                {"name": "proxy", "image": "r.io/proxy:1"}
            ]}}}
        }));
        apply(&mut d, "r.io/api:new", "api").unwrap();
        assert_eq!(d.images(), vec![Some("r.io/api:new"), Some("r.io/proxy:1")]);
    }

    #[test]
    fn empty_container_list() {
        let mut d = deployment(json!({
            "metadata": {"name": "api"},
            "spec": {"template": {"spec": {"containers": []}}}
        }));
        let before = d.clone();

        let err = apply(&mut d, "r.io/api:new", "api-prod").unwrap_err();
        assert_eq!(
            err,
            ManifestError::EmptyContainerList { name: "api".into() }
        );
        assert_eq!(d, before);
    }

    #[test]
    fn returns_same_manifest() {
        let mut d = single_container();
        let returned = apply(&mut d, "r.io/api:x", "api").unwrap();
        returned.set_name("renamed");
        assert_eq!(d.name(), "renamed");
    }
}
