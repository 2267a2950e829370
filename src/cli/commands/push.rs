//! push command - Push the image for a version

use anyhow::{Context as _, Result};

use super::{image_tag, load_config, local_version};
use crate::cli::args::ImageArgs;
use crate::cli::Context;
use crate::platform::{DockerCli, ImageBuilder};
use crate::ui::output;

/// Run the push command.
///
/// The version defaults to the short id of the checked-out commit.
pub fn push(ctx: &Context, image: &ImageArgs, version: Option<&str>) -> Result<()> {
    let work_dir = ctx.work_dir()?;
    let config = load_config(ctx, &work_dir)?;

    let version = match version {
        Some(v) => v.to_string(),
        None => local_version(&config, &work_dir)?,
    };
    let tag = image_tag(&config, image, &version)?.to_string();

    output::prompt(format!("Pushing {}", tag), ctx.verbosity());
    DockerCli::new()
        .push(&tag)
        .with_context(|| format!("cannot push {}", tag))?;
    Ok(())
}
