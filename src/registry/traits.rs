//! registry::traits
//!
//! Registry and session traits for reading image tags from a remote registry.
//!
//! # Design
//!
//! The traits are async because every call is network I/O. A [`Registry`]
//! opens an authenticated [`RegistrySession`] for one domain; the session
//! answers tag listings for repositories on that domain.
//!
//! Nothing here writes to the registry. Errors are terminal for the current
//! operation and are never retried internally.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::credentials::{CredentialError, Credentials};

/// Errors from registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The registry rejected the credentials.
    #[error("authentication to registry '{domain}' failed: {message}")]
    Auth {
        /// Registry domain
        domain: String,
        /// What the registry reported
        message: String,
    },

    /// The registry could not be reached or returned an unexpected response.
    #[error("registry '{domain}' unavailable: {message}")]
    Unavailable {
        /// Registry domain
        domain: String,
        /// Transport or status detail
        message: String,
    },

    /// Credentials for the registry could not be obtained.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// A registry that can open authenticated sessions.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Open a session against `domain` using `credentials`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Auth`] if the credentials are rejected
    /// - [`RegistryError::Unavailable`] on transport failure
    async fn authenticate(
        &self,
        domain: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn RegistrySession>, RegistryError>;
}

/// An authenticated registry session.
#[async_trait]
pub trait RegistrySession: Send + Sync {
    /// List every tag of `repository`.
    ///
    /// A repository with no tags (or that does not exist) yields an empty set.
    async fn list_tags(&self, repository: &str) -> Result<HashSet<String>, RegistryError>;
}
