//! credentials::env_store
//!
//! Credentials from environment variables, for CI runners without a docker
//! login.
//!
//! Reads `{PREFIX}_USERNAME` and `{PREFIX}_PASSWORD`; the default prefix is
//! `KUBEDEPLOY_REGISTRY`. The same pair is used for every registry domain.

use tracing::debug;

use super::traits::{CredentialError, CredentialStore, Credentials};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "KUBEDEPLOY_REGISTRY";

/// Credential store backed by environment variables.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl EnvCredentialStore {
    /// Create a store using [`DEFAULT_ENV_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Create a store using a custom variable prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_names(&self) -> (String, String) {
        (
            format!("{}_USERNAME", self.prefix),
            format!("{}_PASSWORD", self.prefix),
        )
    }
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for EnvCredentialStore {
    fn lookup(&self, domain: &str) -> Result<Credentials, CredentialError> {
        let (user_var, pass_var) = self.var_names();
        debug!(domain, user_var = %user_var, "looking up registry credentials in environment");

        match (std::env::var(&user_var), std::env::var(&pass_var)) {
            (Ok(username), Ok(password)) => Ok(Credentials::new(username, password)),
            _ => Err(CredentialError::NoCredentialsForDomain {
                domain: domain.to_string(),
                source_name: format!("environment ({} / {})", user_var, pass_var),
            }),
        }
    }
}
