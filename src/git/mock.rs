//! git::mock
//!
//! In-memory working copy for deterministic tests.
//!
//! # Example
//!
//! ```
//! use kubedeploy::git::mock::MockWorkingCopy;
//! use kubedeploy::git::WorkingCopy;
//!
//! let wc = MockWorkingCopy::new()
//!     .on_branch("main")
//!     .with_remote_ref("origin", "main", "abc12345def4567890abc123def4567890abc123");
//!
//! assert_eq!(wc.active_branch().unwrap().as_str(), "main");
//! assert_eq!(wc.remotes().unwrap()[0].refs[0].name, "origin/main");
//! ```

use std::collections::HashSet;
use std::sync::Mutex;

use super::traits::{Remote, RemoteRef, WorkingCopy};
use super::GitError;
use crate::core::types::{BranchName, Oid, ShortId};

/// Mock working copy.
///
/// Records fetched remotes so tests can assert on network activity.
#[derive(Debug, Default)]
pub struct MockWorkingCopy {
    branch: Option<String>,
    head: Option<String>,
    remotes: Vec<Remote>,
    failing_fetches: HashSet<String>,
    /// Extra ids that share prefixes with real commits, for ambiguity tests
    other_objects: Vec<String>,
    fetched: Mutex<Vec<String>>,
}

impl MockWorkingCopy {
    /// Create an empty working copy (detached, no remotes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a branch.
    pub fn on_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    /// Set the HEAD commit.
    pub fn with_head(mut self, commit: &str) -> Self {
        self.head = Some(commit.to_string());
        self
    }

    /// Add a remote-tracking ref `{remote}/{branch}` at `commit`.
    ///
    /// The remote is created if it doesn't exist yet.
    ///
    /// # Panics
    ///
    /// Panics if `commit` is not a valid full object id.
    pub fn with_remote_ref(mut self, remote: &str, branch: &str, commit: &str) -> Self {
        let entry = RemoteRef {
            name: format!("{}/{}", remote, branch),
            commit: Oid::new(commit).expect("mock commit must be a full object id"),
        };
        match self.remotes.iter_mut().find(|r| r.name == remote) {
            Some(existing) => existing.refs.push(entry),
            None => self.remotes.push(Remote {
                name: remote.to_string(),
                refs: vec![entry],
            }),
        }
        self
    }

    /// Add a remote with no refs.
    pub fn with_remote(mut self, remote: &str) -> Self {
        self.remotes.push(Remote {
            name: remote.to_string(),
            refs: Vec::new(),
        });
        self
    }

    /// Make fetching `remote` fail.
    pub fn failing_fetch(mut self, remote: &str) -> Self {
        self.failing_fetches.insert(remote.to_string());
        self
    }

    /// Register another object id in the object database.
    pub fn with_object(mut self, id: &str) -> Self {
        self.other_objects.push(id.to_string());
        self
    }

    /// Remotes fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn all_objects(&self) -> impl Iterator<Item = &str> {
        self.remotes
            .iter()
            .flat_map(|r| r.refs.iter().map(|e| e.commit.as_str()))
            .chain(self.head.as_deref())
            .chain(self.other_objects.iter().map(String::as_str))
    }
}

impl WorkingCopy for MockWorkingCopy {
    fn active_branch(&self) -> Result<BranchName, GitError> {
        let branch = self.branch.as_deref().ok_or_else(|| GitError::NoActiveBranch {
            reason: "HEAD is detached".into(),
        })?;
        Ok(BranchName::new(branch)?)
    }

    fn head_commit(&self) -> Result<Oid, GitError> {
        let head = self.head.as_deref().ok_or_else(|| GitError::RefNotFound {
            refname: "HEAD".into(),
        })?;
        Ok(Oid::new(head)?)
    }

    fn remotes(&self) -> Result<Vec<Remote>, GitError> {
        Ok(self.remotes.clone())
    }

    fn fetch(&self, remote: &str) -> Result<(), GitError> {
        self.fetched.lock().unwrap().push(remote.to_string());
        if self.failing_fetches.contains(remote) {
            return Err(GitError::FetchFailed {
                remote: remote.to_string(),
                message: "could not resolve host".into(),
            });
        }
        Ok(())
    }

    fn short_id(&self, commit: &Oid) -> Result<ShortId, GitError> {
        let full = commit.as_str();
        for len in ShortId::MIN_LEN..full.len() {
            let prefix = &full[..len];
            let clash = self
                .all_objects()
                .any(|other| other != full && other.starts_with(prefix));
            if !clash {
                return Ok(ShortId::new(prefix)?);
            }
        }
        Ok(ShortId::new(full)?)
    }
}
