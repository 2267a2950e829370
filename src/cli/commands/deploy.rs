//! deploy command - Resolve, verify, and roll out an image
//!
//! # Flow
//!
//! 1. Version: `--version`, else resolved from git (`--local` uses HEAD)
//! 2. Tag: `{registry}/{image}:{version}`
//! 3. With `--local` (and not `--dry`): build and push the image
//! 4. Probe the registry; a missing image aborts unless `--dry`
//! 5. Show the namespace's deployments
//! 6. With `--dry`: stop here
//! 7. Fetch the live deployment, point it at the tag, and apply it

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::{image_tag, load_config, open_git, registry_probe, resolve_version};
use crate::cli::args::DeployArgs;
use crate::cli::Context;
use crate::core::tag::Tag;
use crate::deploy::{apply, deployment_name};
use crate::git::Resolution;
use crate::platform::{Cluster, DockerCli, ImageBuilder, Kubectl};
use crate::registry::RegistryProbe;
use crate::ui::output::{self, Verbosity};

/// Everything decided before touching the registry or cluster.
#[derive(Debug, Clone)]
struct DeployPlan {
    tag: Tag,
    deployment: String,
    work_dir: PathBuf,
    dry: bool,
    local: bool,
}

/// How a deploy ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    DryRun { image_found: bool },
    Deployed,
}

/// Run the deploy command.
pub fn deploy(ctx: &Context, args: &DeployArgs) -> Result<()> {
    let work_dir = ctx.work_dir()?;
    let config = load_config(ctx, &work_dir)?;
    let verbosity = ctx.verbosity();

    let version = match &args.version {
        Some(version) => version.clone(),
        None => {
            let git = open_git(&config, &work_dir)?;
            let branch = args.branch.as_deref().or(config.branch());
            let resolution = Resolution::from_flags(branch, args.local);
            match &resolution {
                Resolution::Local => output::prompt("Using the checked-out commit", verbosity),
                Resolution::Remote {
                    branch: Some(branch),
                } => output::prompt(format!("Resolving head of '{}'", branch), verbosity),
                Resolution::Remote { branch: None } => {
                    output::prompt("Resolving head of the active branch", verbosity)
                }
            }
            resolve_version(&git, &resolution)?
        }
    };
    output::prompt(format!("Version: {}", version), verbosity);

    let service = args.name.clone().unwrap_or_else(|| config.service_name());
    let environment = args.environment.as_deref().or(config.environment());
    let plan = DeployPlan {
        tag: image_tag(&config, &args.image, &version)?,
        deployment: deployment_name(&service, environment),
        work_dir,
        dry: args.dry,
        local: args.local,
    };

    let probe = registry_probe(&config)?;
    let builder = DockerCli::new();
    let cluster = Kubectl::new(config.namespace());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(execute(&plan, &probe, &builder, &cluster, verbosity))?;
    Ok(())
}

/// Steps 3 to 7 of the flow.
async fn execute(
    plan: &DeployPlan,
    probe: &RegistryProbe,
    builder: &dyn ImageBuilder,
    cluster: &dyn Cluster,
    verbosity: Verbosity,
) -> Result<Outcome> {
    let tag = plan.tag.to_string();

    if plan.local && !plan.dry {
        output::prompt(format!("Building {}", tag), verbosity);
        builder.build(&plan.work_dir, &tag).context("image build failed")?;
        output::prompt(format!("Pushing {}", tag), verbosity);
        builder.push(&tag).context("image push failed")?;
    }

    output::prompt(format!("Checking registry for {}", tag), verbosity);
    let image_found = probe
        .exists(&plan.tag)
        .await
        .with_context(|| format!("cannot verify image {}", tag))?;
    if !image_found {
        if !plan.dry {
            bail!("Image not found: {}", tag);
        }
        output::warn(format!("Image not found: {}", tag), verbosity);
    }

    let info = cluster.info().context("cannot read cluster state")?;
    for line in info.lines() {
        output::prompt_indented(line, 2, verbosity);
    }

    if plan.dry {
        output::prompt("Dry run finished. Not deploying.", verbosity);
        return Ok(Outcome::DryRun { image_found });
    }

    let mut deployment = cluster
        .get_deployment(&plan.deployment)
        .with_context(|| format!("cannot read deployment '{}'", plan.deployment))?;
    apply(&mut deployment, &tag, &plan.deployment)?;
    cluster
        .apply_deployment(&deployment)
        .with_context(|| format!("cannot apply deployment '{}'", plan.deployment))?;

    output::prompt(format!("Deployed {} as '{}'", tag, plan.deployment), verbosity);
    Ok(Outcome::Deployed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentialStore;
    use crate::deploy::{Deployment, DeploymentManifest};
    use crate::platform::mock::{MockOperation, MockPlatform};
    use crate::registry::mock::MockRegistry;
    use serde_json::json;

    const TAG_VERSION: &str = "abc12345";

    fn plan(dry: bool, local: bool) -> DeployPlan {
        DeployPlan {
            tag: Tag::new("r.io", "api", TAG_VERSION),
            deployment: "api-staging".into(),
            work_dir: PathBuf::from("."),
            dry,
            local,
        }
    }

    fn probe(tags: &[&str]) -> RegistryProbe {
        let store = StaticCredentialStore::new().with("r.io", "alice", "secret");
        let registry = MockRegistry::new().with_tags("api", tags);
        RegistryProbe::new(Box::new(store), Box::new(registry))
    }

    fn live_deployment() -> Deployment {
        Deployment::from_json(
            &json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {"name": "api-staging"},
                "spec": {"template": {"spec": {"containers": [
                    {"name": "api", "image": "r.io/api:old"}
                ]}}}
            })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn deploys_existing_image() {
        let platform = MockPlatform::new().with_deployment(live_deployment());
        let outcome = execute(
            &plan(false, false),
            &probe(&[TAG_VERSION]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::Deployed);
        let applied = platform.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].name(), "api-staging");
        assert_eq!(applied[0].images(), vec![Some("r.io/api:abc12345")]);
        assert_eq!(applied[0].spec.revision_history_limit, Some(5));
    }

    #[tokio::test]
    async fn missing_image_aborts() {
        let platform = MockPlatform::new().with_deployment(live_deployment());
        let err = execute(
            &plan(false, false),
            &probe(&["other"]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Image not found: r.io/api:abc12345"));
        assert!(platform.applied().is_empty());
        assert!(!platform.operations().contains(&MockOperation::Info));
    }

    #[tokio::test]
    async fn dry_run_continues_without_image() {
        let platform = MockPlatform::new().with_deployment(live_deployment());
        let outcome = execute(
            &plan(true, false),
            &probe(&[]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::DryRun { image_found: false });
        assert_eq!(platform.operations(), vec![MockOperation::Info]);
    }

    #[tokio::test]
    async fn local_builds_and_pushes_first() {
        let platform = MockPlatform::new().with_deployment(live_deployment());
        execute(
            &plan(false, true),
            &probe(&[TAG_VERSION]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await
        .unwrap();

        let tag = "r.io/api:abc12345".to_string();
        let ops = platform.operations();
        assert_eq!(ops[0], MockOperation::Build { tag: tag.clone() });
        assert_eq!(ops[1], MockOperation::Push { tag });
        assert_eq!(
            ops.last(),
            Some(&MockOperation::Apply {
                name: "api-staging".into()
            })
        );
    }

    #[tokio::test]
    async fn local_dry_run_skips_build() {
        let platform = MockPlatform::new();
        execute(
            &plan(true, true),
            &probe(&[TAG_VERSION]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await
        .unwrap();

        assert_eq!(platform.operations(), vec![MockOperation::Info]);
    }

    #[tokio::test]
    async fn push_failure_stops_deploy() {
        let platform = MockPlatform::new()
            .with_deployment(live_deployment())
            .failing_push();
        let result = execute(
            &plan(false, true),
            &probe(&[TAG_VERSION]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await;

        assert!(result.is_err());
        assert!(platform.applied().is_empty());
    }

    #[tokio::test]
    async fn missing_live_deployment() {
        let platform = MockPlatform::new();
        let err = execute(
            &plan(false, false),
            &probe(&[TAG_VERSION]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("api-staging"));
    }

    #[tokio::test]
    async fn empty_container_list_is_not_applied() {
        let empty = Deployment::from_json(
            &json!({
                "metadata": {"name": "api-staging"},
                "spec": {"template": {"spec": {"containers": []}}}
            })
            .to_string(),
        )
        .unwrap();
        let platform = MockPlatform::new().with_deployment(empty);

        let result = execute(
            &plan(false, false),
            &probe(&[TAG_VERSION]),
            &platform,
            &platform,
            Verbosity::Quiet,
        )
        .await;
        assert!(result.is_err());
        assert!(platform.applied().is_empty());
    }
}
