//! resolve command - Print the version `deploy` would use
//!
//! Prints only the short commit id so scripts can capture it:
//!
//! ```bash
//! VERSION=$(kubedeploy resolve --branch main)
//! ```

use anyhow::Result;

use super::{load_config, open_git, resolve_version};
use crate::cli::Context;
use crate::git::Resolution;
use crate::ui::output;

/// Run the resolve command.
pub fn resolve(ctx: &Context, branch: Option<&str>, local: bool) -> Result<()> {
    let work_dir = ctx.work_dir()?;
    let config = load_config(ctx, &work_dir)?;
    let git = open_git(&config, &work_dir)?;

    let branch = branch.or(config.branch());
    let version = resolve_version(&git, &Resolution::from_flags(branch, local))?;
    output::print(version);
    Ok(())
}
