//! platform::docker
//!
//! Image build and push through the `docker` CLI.

use std::path::Path;

use tracing::info;

use super::{run, ImageBuilder, Output, PlatformError};

/// `docker` command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    /// Use `docker` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use a specific binary (e.g. `podman`).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder for DockerCli {
    fn build(&self, context_dir: &Path, tag: &str) -> Result<(), PlatformError> {
        info!(tag, dir = %context_dir.display(), "building image");
        run(
            &self.program,
            &["build", "-t", tag, "."],
            Some(context_dir),
            None,
            Output::Inherit,
        )?;
        Ok(())
    }

    fn push(&self, tag: &str) -> Result<(), PlatformError> {
        info!(tag, "pushing image");
        run(&self.program, &["push", tag], None, None, Output::Inherit)?;
        Ok(())
    }
}
