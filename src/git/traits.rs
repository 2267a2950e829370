//! git::traits
//!
//! The capability surface the version resolver needs from a working copy.
//!
//! # Design
//!
//! [`WorkingCopy`] is deliberately small: the active branch, the current
//! commit, the remotes with their remote-tracking refs, a fetch, and short
//! ids. [`Git`](super::Git) implements it on top of git2 (plus the git
//! CLI for network fetches); [`MockWorkingCopy`](super::mock::MockWorkingCopy)
//! implements it in memory for tests.

use super::GitError;
use crate::core::types::{BranchName, Oid, ShortId};

/// A remote-tracking ref such as `origin/main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Short ref name, `{remote}/{branch}`
    pub name: String,
    /// Commit the `refs/remotes/` ref peels to
    pub commit: Oid,
}

/// A configured remote and the refs tracked under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Remote name (e.g. `origin`)
    pub name: String,
    /// Remote-tracking refs under `refs/remotes/{name}/`
    pub refs: Vec<RemoteRef>,
}

impl Remote {
    /// The ref name a branch of this remote is tracked under.
    ///
    /// This follows the default fetch refspec convention
    /// (`refs/remotes/{remote}/{branch}`); custom refspecs are not consulted.
    pub fn tracking_name(&self, branch: &BranchName) -> String {
        format!("{}/{}", self.name, branch)
    }
}

/// Read and fetch operations on a working copy.
pub trait WorkingCopy {
    /// The checked-out branch.
    ///
    /// Fails with [`GitError::NoActiveBranch`] when HEAD is detached or unborn,
    /// or a rebase, merge, cherry-pick or similar operation is in progress.
    fn active_branch(&self) -> Result<BranchName, GitError>;

    /// The commit HEAD points at.
    fn head_commit(&self) -> Result<Oid, GitError>;

    /// All remotes with their current remote-tracking refs.
    fn remotes(&self) -> Result<Vec<Remote>, GitError>;

    /// Update the remote-tracking refs of one remote (network I/O).
    fn fetch(&self, remote: &str) -> Result<(), GitError>;

    /// The shortest unique abbreviation of a commit, at least
    /// [`ShortId::MIN_LEN`] characters.
    fn short_id(&self, commit: &Oid) -> Result<ShortId, GitError>;
}
