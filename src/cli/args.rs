//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version (top level only)
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Errors only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// kubedeploy - resolve, verify, and roll out container images to Kubernetes
#[derive(Parser, Debug)]
#[command(name = "kubedeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if kubedeploy was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging (overridden by KUBEDEPLOY_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Where the image lives. Unset values come from `.kubedeploy.toml`.
#[derive(Args, Debug, Clone, Default)]
pub struct ImageArgs {
    /// Registry domain, e.g. registry.example.com
    #[arg(long)]
    pub registry: Option<String>,

    /// Repository name within the registry (defaults to the service name)
    #[arg(long)]
    pub image: Option<String>,
}

/// Arguments of `kubedeploy deploy`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Branch whose remote head is deployed (defaults to the active branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Deploy this version instead of resolving one from git
    #[arg(long = "version", id = "tag_version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Environment suffix for the deployment name, e.g. staging
    #[arg(long)]
    pub environment: Option<String>,

    /// Deployment name (defaults to the service name)
    #[arg(long)]
    pub name: Option<String>,

    /// Check everything but do not build, push, or deploy
    #[arg(long)]
    pub dry: bool,

    /// Build and push the checked-out commit instead of a remote branch head
    #[arg(long)]
    pub local: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a version, verify its image, and roll it out
    #[command(
        long_about = "Resolve the version to deploy, verify the image exists in the \
            registry, and point the service's deployment at it.\n\n\
            Without --version, the version is the short commit id of the branch head \
            on the remotes. All remotes tracking the branch must agree on that commit.",
        after_help = "\
EXAMPLES:
    # Deploy the head of main as seen by the remotes
    kubedeploy deploy --branch main

    # Build, push, and deploy the checked-out commit to staging
    kubedeploy deploy --local --environment staging

    # Check what would be deployed without touching the cluster
    kubedeploy deploy --dry"
    )]
    Deploy(DeployArgs),

    /// Build the image for a version (defaults to the local HEAD)
    Build {
        #[command(flatten)]
        image: ImageArgs,

        /// Version to tag the image with
        #[arg(long = "version", id = "tag_version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Push the image for a version (defaults to the local HEAD)
    Push {
        #[command(flatten)]
        image: ImageArgs,

        /// Version of the image to push
        #[arg(long = "version", id = "tag_version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Show the deployments in the service's namespace
    Info {
        /// Namespace to inspect (defaults to the configured namespace)
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Print the version that `deploy` would use
    Resolve {
        /// Branch to resolve (defaults to the active branch)
        #[arg(long)]
        branch: Option<String>,

        /// Use the checked-out commit
        #[arg(long)]
        local: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_deploy() {
        let cli = Cli::try_parse_from([
            "kubedeploy",
            "deploy",
            "--registry",
            "r.io",
            "--branch",
            "main",
            "--version",
            "abc12345",
            "--environment",
            "staging",
            "--dry",
        ])
        .unwrap();

        match cli.command {
            Command::Deploy(args) => {
                assert_eq!(args.image.registry.as_deref(), Some("r.io"));
                assert_eq!(args.branch.as_deref(), Some("main"));
                assert_eq!(args.version.as_deref(), Some("abc12345"));
                assert_eq!(args.environment.as_deref(), Some("staging"));
                assert!(args.dry);
                assert!(!args.local);
            }
            other => panic!("expected deploy, got {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["kubedeploy", "resolve", "--local", "-q", "--debug"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Resolve { local: true, .. }));
    }

    #[test]
    fn build_version_flag() {
        let cli = Cli::try_parse_from(["kubedeploy", "build", "--version", "v1"]).unwrap();
        match cli.command {
            Command::Build { version, .. } => assert_eq!(version.as_deref(), Some("v1")),
            other => panic!("expected build, got {:?}", other),
        }
    }
}
