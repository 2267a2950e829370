//! git
//!
//! Working-copy access and version resolution.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. No other module imports
//! `git2`. Commands depend on the [`WorkingCopy`] capability trait rather
//! than on [`Git`] directly, so resolution logic can run against
//! [`mock::MockWorkingCopy`] in tests.
//!
//! # Modules
//!
//! - `interface`: [`Git`], the git2-backed working copy
//! - `traits`: [`WorkingCopy`] and the remote/ref types it returns
//! - [`resolver`]: picks the commit to deploy (local HEAD or agreed remote head)
//! - [`mock`]: in-memory working copy for tests
//!
//! # Example
//!
//! ```ignore
//! use kubedeploy::git::{Git, resolver::{resolve, Resolution}};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let version = resolve(&git, &Resolution::branch("main"))?;
//! println!("deploying {}", version);
//! ```

mod interface;
pub mod mock;
pub mod resolver;
mod traits;

pub use interface::{Git, GitError};
pub use resolver::{resolve, Resolution, ResolveError};
pub use traits::{Remote, RemoteRef, WorkingCopy};
