//! credentials::traits
//!
//! Registry credential lookup trait.
//!
//! # Design
//!
//! A [`CredentialStore`] maps a registry domain to a username/password pair.
//! Lookups always read the backing source afresh; nothing is cached and
//! nothing is written back.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include passwords or encoded blobs in error messages
//! - Be thread-safe (Send + Sync)

use std::path::PathBuf;

use thiserror::Error;

/// Errors from credential lookup.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// The credential file does not exist or cannot be read.
    #[error("cannot read credential file {}: {message}", .path.display())]
    FileMissing {
        /// Path that was read
        path: PathBuf,
        /// I/O failure detail
        message: String,
    },

    /// The credential file is not valid JSON or lacks the expected structure.
    #[error("malformed credential file {}: {message}", .path.display())]
    FileMalformed {
        /// Path that was read
        path: PathBuf,
        /// What is wrong with it
        message: String,
    },

    /// The source holds no credentials for the domain.
    #[error("no credentials for registry '{domain}' in {source_name}")]
    NoCredentialsForDomain {
        /// Registry domain that was looked up
        domain: String,
        /// Where the lookup happened (file path or environment)
        source_name: String,
    },

    /// The stored credentials could not be decoded into `username:password`.
    #[error("cannot decode credentials for registry '{domain}': {message}")]
    Decode {
        /// Registry domain that was looked up
        domain: String,
        /// Decoding failure detail
        message: String,
    },

    /// Provider not available or not configured.
    #[error("credential provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// A registry login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Registry user name
    pub username: String,
    /// Registry password or access token
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Trait for registry credential providers.
///
/// # Example
///
/// ```ignore
/// use kubedeploy::credentials::{CredentialStore, DockerConfigStore};
///
/// let store = DockerConfigStore::new()?;
/// let creds = store.lookup("registry.example.com")?;
/// println!("logging in as {}", creds.username);
/// ```
pub trait CredentialStore: Send + Sync {
    /// Get the credentials for a registry domain.
    ///
    /// # Security
    ///
    /// The returned password is the raw secret. Do not log or print it.
    fn lookup(&self, domain: &str) -> Result<Credentials, CredentialError>;
}
