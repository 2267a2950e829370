//! platform
//!
//! The container and cluster tools the rollout drives.
//!
//! Both are reached through the local CLIs (`docker`, `kubectl`) so the
//! user's existing logins, contexts, and kubeconfig apply unchanged.
//!
//! - [`ImageBuilder`] / [`DockerCli`]: build and push images
//! - [`Cluster`] / [`Kubectl`]: read and apply deployments
//! - [`mock`]: recording doubles for tests

mod docker;
mod kubectl;
pub mod mock;

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::deploy::{Deployment, ManifestError};

pub use docker::DockerCli;
pub use kubectl::Kubectl;

/// Errors from external tools.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The tool could not be started.
    #[error("cannot run '{program}': {message}")]
    Spawn {
        /// Program name
        program: String,
        /// OS error detail
        message: String,
    },

    /// The tool ran and reported failure.
    #[error("'{command}' failed: {message}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Trimmed stderr, or the exit status
        message: String,
    },

    /// The cluster returned a manifest that could not be handled.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Builds and publishes container images.
pub trait ImageBuilder {
    /// Build the image in `context_dir`, tagged `tag`.
    fn build(&self, context_dir: &Path, tag: &str) -> Result<(), PlatformError>;

    /// Push `tag` to its registry.
    fn push(&self, tag: &str) -> Result<(), PlatformError>;
}

/// Reads and applies deployments in one namespace.
pub trait Cluster {
    /// Human-readable summary of the namespace's deployments.
    fn info(&self) -> Result<String, PlatformError>;

    /// Fetch the live deployment called `name`.
    fn get_deployment(&self, name: &str) -> Result<Deployment, PlatformError>;

    /// Apply a deployment manifest.
    fn apply_deployment(&self, deployment: &Deployment) -> Result<(), PlatformError>;
}

/// How a child's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
    /// Stream stdout/stderr to the terminal.
    Inherit,
    /// Capture stdout and return it.
    Capture,
}

/// Run `program args...`, optionally feeding `stdin`.
///
/// Returns captured stdout for [`Output::Capture`], an empty string otherwise.
pub(crate) fn run(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    stdin: Option<&str>,
    output: Output,
) -> Result<String, PlatformError> {
    let command_line = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(command = %command_line, "running");

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    if output == Output::Capture {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
    }

    let mut child = command.spawn().map_err(|e| PlatformError::Spawn {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    // Input is written while output is drained, so neither side can block the other
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_owned();
            Some(std::thread::spawn(move || pipe.write_all(input.as_bytes())))
        }
        _ => None,
    };

    let result = child
        .wait_with_output()
        .map_err(|e| PlatformError::CommandFailed {
            command: command_line.clone(),
            message: e.to_string(),
        })?;
    let written = writer.map(|handle| {
        handle
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::other("input writer panicked")))
    });

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            result.status.to_string()
        } else {
            stderr
        };
        return Err(PlatformError::CommandFailed {
            command: command_line,
            message,
        });
    }
    if let Some(Err(e)) = written {
        return Err(PlatformError::CommandFailed {
            command: command_line,
            message: format!("cannot write input: {}", e),
        });
    }

    Ok(String::from_utf8_lossy(&result.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program() {
        let err = run(
            "kubedeploy-no-such-program",
            &[],
            None,
            None,
            Output::Capture,
        )
        .unwrap_err();
        assert!(matches!(err, PlatformError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_feeds_stdin() {
        let out = run("cat", &[], None, Some("hello"), Output::Capture).unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn large_output_before_reading_input() {
        // Both directions exceed a pipe buffer
        let input = "i".repeat(300_000);
        let out = run(
            "sh",
            &["-c", "head -c 300000 /dev/zero | tr '\\0' o; cat"],
            None,
            Some(&input),
            Output::Capture,
        )
        .unwrap();
        assert_eq!(out.len(), 600_000);
        assert!(out.starts_with('o'));
        assert!(out.ends_with('i'));
    }

    #[cfg(unix)]
    #[test]
    fn failure_carries_stderr() {
        let err = run(
            "sh",
            &["-c", "echo broken >&2; exit 3"],
            None,
            None,
            Output::Capture,
        )
        .unwrap_err();
        match err {
            PlatformError::CommandFailed { command, message } => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(message, "broken");
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }
}
