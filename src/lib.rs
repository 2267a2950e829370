//! kubedeploy - resolve, verify, and roll out container images to Kubernetes
//!
//! kubedeploy picks the commit to deploy from a git working copy, checks that
//! the matching image exists in its registry, and points the service's
//! Kubernetes deployment at it.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, wires the pieces)
//! - [`core`] - Domain types, image tags, and configuration
//! - [`git`] - Working copy access and version resolution
//! - [`credentials`] - Registry credential lookup
//! - [`registry`] - Registry sessions and the tag existence probe
//! - [`deploy`] - Deployment manifests and their mutation
//! - [`platform`] - `docker` and `kubectl` collaborators
//! - [`ui`] - Console output
//!
//! # Guarantees
//!
//! 1. A version is only resolved when every remote tracking the branch agrees
//! 2. Nothing is deployed unless the image is present in the registry
//! 3. Credentials are read fresh and never logged
//! 4. Failures are returned as typed errors; only the binary decides the exit

pub mod cli;
pub mod core;
pub mod credentials;
pub mod deploy;
pub mod git;
pub mod platform;
pub mod registry;
pub mod ui;
