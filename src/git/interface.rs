//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to Git repositories. Reads go through
//! git2; remote fetches shell out to the `git` CLI so that the user's SSH
//! agent, credential helpers and proxy settings apply unchanged.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested revision does not exist
//! - [`GitError::NoActiveBranch`]: HEAD is detached/unborn or an operation is in progress
//! - [`GitError::FetchFailed`]: `git fetch` failed or exceeded its deadline
//!
//! # Example
//!
//! ```ignore
//! use kubedeploy::git::{Git, WorkingCopy};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head_commit()?;
//! println!("HEAD is at {}", git.short_id(&head)?);
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use super::traits::{Remote, RemoteRef, WorkingCopy};
use crate::core::types::{BranchName, Oid, ShortId, TypeError};

/// How often a running fetch is polled for completion.
const FETCH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The revision that was not found
        refname: String,
    },

    /// There is no single checked-out branch.
    #[error("no active branch: {reason}")]
    NoActiveBranch {
        /// Why the branch is inconclusive (detached HEAD, rebase in progress, ...)
        reason: String,
    },

    /// Fetching a remote failed.
    #[error("fetch of remote '{remote}' failed: {message}")]
    FetchFailed {
        /// The remote being fetched
        remote: String,
        /// Stderr of git, or the deadline that was exceeded
        message: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid branch name.
    #[error("invalid branch name: {message}")]
    InvalidBranchName {
        /// Description of the problem
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) | TypeError::InvalidShortId(msg) => {
                GitError::InvalidOid { oid: msg }
            }
            TypeError::InvalidBranchName(msg) => GitError::InvalidBranchName { message: msg },
        }
    }
}

/// The Git interface.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
    /// Working directory, used as cwd for `git fetch`
    work_dir: PathBuf,
    /// Upper bound for a single `git fetch`
    fetch_timeout: Option<Duration>,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        let work_dir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();

        Ok(Self {
            repo,
            work_dir,
            fetch_timeout: None,
        })
    }

    /// Bound every fetch by `timeout`; the git process is killed when it expires.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The repository's working directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Describe an in-progress operation, if any.
    fn operation_in_progress(&self) -> Option<&'static str> {
        match self.repo.state() {
            git2::RepositoryState::Clean => None,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge
            | git2::RepositoryState::ApplyMailboxOrRebase => Some("rebase"),
            git2::RepositoryState::Merge => Some("merge"),
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                Some("cherry-pick")
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                Some("revert")
            }
            git2::RepositoryState::Bisect => Some("bisect"),
            git2::RepositoryState::ApplyMailbox => Some("apply-mailbox"),
        }
    }

    /// Remote-tracking refs under `refs/remotes/{remote}/`.
    fn remote_refs(&self, remote: &str) -> Result<Vec<RemoteRef>, GitError> {
        let pattern = format!("refs/remotes/{}/*", remote);
        let refs = self
            .repo
            .references_glob(&pattern)
            .map_err(|e| GitError::from_git2(e, &pattern))?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::from_git2(e, &pattern))?;

            // Skip refs with non-UTF8 names
            let Some(name) = reference.name() else {
                continue;
            };
            let Some(short) = name.strip_prefix("refs/remotes/") else {
                continue;
            };
            // Symbolic refs like origin/HEAD that don't peel are not branches
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };

            entries.push(RemoteRef {
                name: short.to_string(),
                commit: Oid::new(commit.id().to_string())?,
            });
        }

        Ok(entries)
    }

    /// Run a prepared fetch command, failing with its stderr on a non-zero exit.
    fn run_fetch(&self, remote: &str, mut command: Command) -> Result<(), GitError> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GitError::FetchFailed {
                remote: remote.to_string(),
                message: format!("cannot run git: {}", e),
            })?;

        // Drained concurrently so a chatty fetch cannot fill the pipe and stall
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut message = String::new();
                let _ = pipe.read_to_string(&mut message);
                message
            })
        });
        let status = self.wait_for_fetch(remote, child)?;

        if !status.success() {
            let message = stderr
                .and_then(|reader| reader.join().ok())
                .unwrap_or_default();
            return Err(GitError::FetchFailed {
                remote: remote.to_string(),
                message: message.trim().to_string(),
            });
        }

        Ok(())
    }

    /// Wait for a fetch child process, honoring the configured deadline.
    fn wait_for_fetch(
        &self,
        remote: &str,
        mut child: std::process::Child,
    ) -> Result<std::process::ExitStatus, GitError> {
        let failed = |message: String| GitError::FetchFailed {
            remote: remote.to_string(),
            message,
        };

        let Some(timeout) = self.fetch_timeout else {
            return child.wait().map_err(|e| failed(e.to_string()));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(|e| failed(e.to_string()))? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // Best effort; the process may have exited in between
                let _ = child.kill();
                let _ = child.wait();
                return Err(failed(format!("timed out after {}s", timeout.as_secs())));
            }
            std::thread::sleep(FETCH_POLL_INTERVAL);
        }
    }
}

impl WorkingCopy for Git {
    fn active_branch(&self) -> Result<BranchName, GitError> {
        if let Some(operation) = self.operation_in_progress() {
            return Err(GitError::NoActiveBranch {
                reason: format!("{} in progress", operation),
            });
        }

        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                return Err(GitError::NoActiveBranch {
                    reason: "HEAD is unborn (no commits yet)".into(),
                })
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        if !head.is_branch() {
            return Err(GitError::NoActiveBranch {
                reason: "HEAD is detached".into(),
            });
        }

        let name = head.shorthand().ok_or_else(|| GitError::NoActiveBranch {
            reason: "branch name is not valid UTF-8".into(),
        })?;
        Ok(BranchName::new(name)?)
    }

    fn head_commit(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Ok(Oid::new(oid.to_string())?)
    }

    fn remotes(&self) -> Result<Vec<Remote>, GitError> {
        let names = self
            .repo
            .remotes()
            .map_err(|e| GitError::from_git2(e, "remotes"))?;

        let mut remotes = Vec::new();
        for name in names.iter().flatten() {
            remotes.push(Remote {
                name: name.to_string(),
                refs: self.remote_refs(name)?,
            });
        }
        Ok(remotes)
    }

    fn fetch(&self, remote: &str) -> Result<(), GitError> {
        debug!(remote, timeout = ?self.fetch_timeout, "fetching remote");

        let mut command = Command::new("git");
        command
            .current_dir(&self.work_dir)
            .args(["fetch", "--quiet", remote])
            .env("GIT_TERMINAL_PROMPT", "0");
        self.run_fetch(remote, command)
    }

    fn short_id(&self, commit: &Oid) -> Result<ShortId, GitError> {
        let full = git2::Oid::from_str(commit.as_str())
            .map_err(|e| GitError::from_git2(e, commit.as_str()))?;
        let odb = self
            .repo
            .odb()
            .map_err(|e| GitError::from_git2(e, "object database"))?;

        let full_len = commit.as_str().len();
        for len in ShortId::MIN_LEN..full_len {
            match odb.exists_prefix(full, len) {
                Ok(_) => return Ok(ShortId::new(commit.short(len))?),
                Err(e) if e.code() == git2::ErrorCode::Ambiguous => continue,
                Err(e) => return Err(GitError::from_git2(e, commit.as_str())),
            }
        }

        Ok(ShortId::new(commit.as_str())?)
    }
}
