//! info command - Show the deployments in a namespace

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::platform::{Cluster, Kubectl};
use crate::ui::output;

/// Run the info command.
pub fn info(ctx: &Context, namespace: Option<&str>) -> Result<()> {
    let work_dir = ctx.work_dir()?;
    let config = load_config(ctx, &work_dir)?;
    let namespace = namespace.unwrap_or(config.namespace());

    output::prompt(format!("Namespace: {}", namespace), ctx.verbosity());
    let summary = Kubectl::new(namespace)
        .info()
        .with_context(|| format!("cannot read deployments in namespace '{}'", namespace))?;
    output::print(summary.trim_end());
    Ok(())
}
