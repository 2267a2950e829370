//! git::resolver
//!
//! Picks the single commit that is authoritative for a deployment.
//!
//! # Resolution rules
//!
//! - **Local**: the short id of HEAD. Branch and remotes are ignored and no
//!   network access happens.
//! - **Branch** (given, or the active branch when absent): every remote is
//!   fetched in turn, then every remote-tracking ref named exactly
//!   `{remote}/{branch}` is collected.
//!   - No match fails with [`ResolveError::NoTrackingBranch`].
//!   - Several matches that resolve to different commits fail with
//!     [`ResolveError::AmbiguousRemotes`]. Remotes that disagree are never
//!     ranked against each other.
//!   - One match, or several agreeing matches, yield the short id of that commit.
//!
//! Nothing is retried; every failure is returned to the caller.
//!
//! # Example
//!
//! ```
//! use kubedeploy::git::mock::MockWorkingCopy;
//! use kubedeploy::git::resolver::{resolve, Resolution};
//!
//! let sha = "abc12345def4567890abc123def4567890abc123";
//! let wc = MockWorkingCopy::new()
//!     .with_remote_ref("origin", "main", sha)
//!     .with_remote_ref("mirror", "main", sha);
//!
//! let version = resolve(&wc, &Resolution::branch("main")).unwrap();
//! assert_eq!(version.as_str(), "abc12345");
//! ```

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info};

use super::traits::{RemoteRef, WorkingCopy};
use super::GitError;
use crate::core::types::{BranchName, Oid, ShortId};

/// Errors from version resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No branch was given and the working copy has no single active branch.
    #[error("no branch given and current status is inconclusive: {reason}")]
    AmbiguousState {
        /// Detached HEAD, rebase in progress, ...
        reason: String,
    },

    /// No remote tracks the branch.
    #[error("no remote tracking branch matching '{branch}' found")]
    NoTrackingBranch {
        /// The requested branch
        branch: String,
    },

    /// Remotes disagree on the head of the branch.
    #[error(
        "multiple remotes disagree on HEAD of branch '{branch}' ({}); make sure the requested deployment is unambiguous",
        .refs.join(", ")
    )]
    AmbiguousRemotes {
        /// The requested branch
        branch: String,
        /// `{ref} at {short commit}` for every matching ref
        refs: Vec<String>,
    },

    /// Fetching a remote failed.
    #[error("network error while fetching remote '{remote}': {message}")]
    Network {
        /// The remote that failed
        remote: String,
        /// Failure detail
        message: String,
    },

    /// The branch argument is not a valid branch name.
    #[error("invalid branch name: {0}")]
    InvalidBranch(String),

    /// Any other repository failure.
    #[error(transparent)]
    Git(GitError),
}

impl From<GitError> for ResolveError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NoActiveBranch { reason } => ResolveError::AmbiguousState { reason },
            GitError::FetchFailed { remote, message } => ResolveError::Network { remote, message },
            other => ResolveError::Git(other),
        }
    }
}

/// What to resolve a version from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The checked-out commit, without touching remotes.
    Local,
    /// The remote head of a branch; `None` means the active branch.
    Remote {
        /// Branch to resolve
        branch: Option<String>,
    },
}

impl Resolution {
    /// Resolve the remote head of `branch`.
    pub fn branch(branch: impl Into<String>) -> Self {
        Resolution::Remote {
            branch: Some(branch.into()),
        }
    }

    /// Resolve the remote head of the active branch.
    pub fn active_branch() -> Self {
        Resolution::Remote { branch: None }
    }

    /// Build from CLI-style inputs: `local` wins over any branch.
    pub fn from_flags(branch: Option<&str>, local: bool) -> Self {
        if local {
            Resolution::Local
        } else {
            Resolution::Remote {
                branch: branch.map(String::from),
            }
        }
    }
}

/// Resolve the version (short commit id) to deploy.
///
/// # Errors
///
/// See [`ResolveError`]; every variant is terminal.
pub fn resolve(wc: &dyn WorkingCopy, resolution: &Resolution) -> Result<ShortId, ResolveError> {
    match resolution {
        Resolution::Local => {
            let head = wc.head_commit()?;
            let short = wc.short_id(&head)?;
            debug!(version = %short, "resolved local HEAD");
            Ok(short)
        }
        Resolution::Remote { branch } => {
            let branch = match branch {
                Some(name) => BranchName::new(name.as_str())
                    .map_err(|e| ResolveError::InvalidBranch(e.to_string()))?,
                None => wc.active_branch()?,
            };
            let commit = remote_head(wc, &branch)?;
            Ok(wc.short_id(&commit)?)
        }
    }
}

/// Fetch every remote and reconcile the refs tracking `branch`.
fn remote_head(wc: &dyn WorkingCopy, branch: &BranchName) -> Result<Oid, ResolveError> {
    info!(%branch, "getting remote HEAD");

    // Fetch each remote before reading its refs
    let remote_names: Vec<String> = wc.remotes()?.into_iter().map(|r| r.name).collect();
    for name in &remote_names {
        wc.fetch(name)?;
    }

    let mut matches: Vec<RemoteRef> = Vec::new();
    for remote in wc.remotes()? {
        let wanted = remote.tracking_name(branch);
        for entry in remote.refs.into_iter().filter(|r| r.name == wanted) {
            debug!(
                refname = %entry.name,
                commit = %ShortId::from_oid(&entry.commit),
                "found remote tracking ref"
            );
            matches.push(entry);
        }
    }

    let first = match matches.first() {
        Some(first) => first.clone(),
        None => {
            return Err(ResolveError::NoTrackingBranch {
                branch: branch.to_string(),
            })
        }
    };

    if matches.len() > 1 {
        // Compare the commits the tracking refs were peeled to; a short name
        // like `origin/main` can be shadowed by a tag or local branch
        let resolved: BTreeSet<&Oid> = matches.iter().map(|entry| &entry.commit).collect();
        let described: Vec<String> = matches
            .iter()
            .map(|entry| format!("{} at {}", entry.name, ShortId::from_oid(&entry.commit)))
            .collect();

        if resolved.len() > 1 {
            return Err(ResolveError::AmbiguousRemotes {
                branch: branch.to_string(),
                refs: described,
            });
        }
        debug!(count = matches.len(), "remotes agree on branch head");
    }

    Ok(first.commit)
}
