//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration for the service directory
//! 2. Merges flags over configuration
//! 3. Drives the library and reports progress
//!
//! # Async Commands
//!
//! Registry access is async. Handlers that probe the registry build a tokio
//! runtime and block on the async part.

mod build;
mod completion;
mod deploy;
mod info;
mod push;
mod resolve;

pub use build::build;
pub use completion::completion;
pub use deploy::deploy;
pub use info::info;
pub use push::push;
pub use resolve::resolve;

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::args::{Command, ImageArgs};
use super::Context;
use crate::core::config::{Config, SERVICE_CONFIG_FILE};
use crate::core::tag::Tag;
use crate::credentials;
use crate::git::{self, Git, Resolution};
use crate::registry::{HttpRegistry, RegistryProbe};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Deploy(args) => deploy::deploy(ctx, &args),
        Command::Build { image, version } => build::build(ctx, &image, version.as_deref()),
        Command::Push { image, version } => push::push(ctx, &image, version.as_deref()),
        Command::Info { namespace } => info::info(ctx, namespace.as_deref()),
        Command::Resolve { branch, local } => resolve::resolve(ctx, branch.as_deref(), local),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load configuration for the service directory, reporting warnings.
fn load_config(ctx: &Context, work_dir: &Path) -> Result<Config> {
    let loaded = Config::load(work_dir).context("failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{}: {}", warning.path.display(), warning.message),
            ctx.verbosity(),
        );
    }
    Ok(loaded.config)
}

/// The image tag for `version`, with flags taking precedence over config.
fn image_tag(config: &Config, args: &ImageArgs, version: &str) -> Result<Tag> {
    let Some(registry) = args.registry.as_deref().or(config.registry()) else {
        bail!(
            "no registry configured; pass --registry or set `registry` in {}",
            SERVICE_CONFIG_FILE
        );
    };
    let image = args.image.clone().unwrap_or_else(|| config.image());

    if registry.is_empty() || registry.contains('/') {
        bail!("invalid registry '{}': expected a domain such as registry.example.com", registry);
    }
    if image.is_empty() || image.contains(':') {
        bail!("invalid image name '{}'", image);
    }
    if version.is_empty() {
        bail!("version must not be empty");
    }

    Ok(Tag::new(registry, image, version))
}

/// Open the working copy with the configured fetch deadline.
fn open_git(config: &Config, work_dir: &Path) -> Result<Git> {
    let git = Git::open(work_dir)
        .with_context(|| format!("cannot open git repository at {}", work_dir.display()))?;
    Ok(git.with_fetch_timeout(config.fetch_timeout()))
}

/// Resolve a version from the working copy.
fn resolve_version(wc: &dyn git::WorkingCopy, resolution: &Resolution) -> Result<String> {
    let version = git::resolve(wc, resolution).context("cannot resolve version to deploy")?;
    Ok(version.to_string())
}

/// The short id of the checked-out commit.
fn local_version(config: &Config, work_dir: &Path) -> Result<String> {
    let git = open_git(config, work_dir)?;
    resolve_version(&git, &Resolution::Local)
}

/// Probe wired to the configured credential provider and the HTTP registry.
fn registry_probe(config: &Config) -> Result<RegistryProbe> {
    let store = credentials::create_store(config.credentials_provider(), config.credentials_path())
        .context("cannot set up registry credentials")?;

    let mut registry = HttpRegistry::new();
    if let Some(timeout) = config.registry_timeout() {
        registry = registry.with_timeout(timeout);
    }

    Ok(RegistryProbe::new(store, Box::new(registry)))
}
