//! credentials::docker_config
//!
//! Credentials from a docker CLI `config.json`.
//!
//! # Format
//!
//! ```json
//! {
//!   "auths": {
//!     "registry.example.com": { "auth": "YWxpY2U6c2VjcmV0" }
//!   }
//! }
//! ```
//!
//! `auth` is `base64("username:password")`. Other keys written by the docker
//! CLI (`credsStore`, `HttpHeaders`, ...) are ignored, but `auths` itself is
//! required.
//!
//! # Location
//!
//! `$DOCKER_CONFIG/config.json` if `DOCKER_CONFIG` is set, otherwise
//! `~/.docker/config.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tracing::debug;

use super::traits::{CredentialError, CredentialStore, Credentials};

/// Top-level shape of the credential file.
#[derive(Debug, Deserialize)]
struct DockerConfigFile {
    auths: HashMap<String, AuthEntry>,
}

/// One `auths` entry.
#[derive(Debug, Deserialize)]
struct AuthEntry {
    auth: Option<String>,
}

/// Credential store backed by a docker `config.json`.
#[derive(Debug, Clone)]
pub struct DockerConfigStore {
    /// Path to the config file
    path: PathBuf,
}

impl DockerConfigStore {
    /// Create a store at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `DOCKER_CONFIG` nor the home directory
    /// can be determined.
    pub fn new() -> Result<Self, CredentialError> {
        if let Some(dir) = std::env::var_os("DOCKER_CONFIG") {
            return Ok(Self::with_path(PathBuf::from(dir).join("config.json")));
        }
        let home = dirs::home_dir().ok_or_else(|| {
            CredentialError::ProviderNotAvailable("cannot determine home directory".into())
        })?;
        Ok(Self::with_path(home.join(".docker").join("config.json")))
    }

    /// Create a store reading an explicit file.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the path to the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<DockerConfigFile, CredentialError> {
        let content = fs::read_to_string(&self.path).map_err(|e| CredentialError::FileMissing {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| CredentialError::FileMalformed {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl CredentialStore for DockerConfigStore {
    fn lookup(&self, domain: &str) -> Result<Credentials, CredentialError> {
        debug!(domain, path = %self.path.display(), "looking up registry credentials");

        let file = self.read_file()?;
        let entry = file
            .auths
            .get(domain)
            .ok_or_else(|| CredentialError::NoCredentialsForDomain {
                domain: domain.to_string(),
                source_name: self.path.display().to_string(),
            })?;

        // Entries without "auth" are left behind by credential helpers
        let blob = entry
            .auth
            .as_deref()
            .ok_or_else(|| CredentialError::FileMalformed {
                path: self.path.clone(),
                message: format!("auths entry for '{}' has no 'auth' value", domain),
            })?;

        decode_auth(domain, blob)
    }
}

/// Decode `base64("username:password")`.
///
/// The split happens at the first `:`; the password may contain further colons.
fn decode_auth(domain: &str, blob: &str) -> Result<Credentials, CredentialError> {
    let decode_error = |message: &str| CredentialError::Decode {
        domain: domain.to_string(),
        message: message.to_string(),
    };

    let bytes = STANDARD
        .decode(blob.trim())
        .map_err(|_| decode_error("value is not valid base64"))?;
    let text = String::from_utf8(bytes).map_err(|_| decode_error("value is not valid UTF-8"))?;
    let (username, password) = text
        .split_once(':')
        .ok_or_else(|| decode_error("expected 'username:password'"))?;

    Ok(Credentials::new(username, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn encode(s: &str) -> String {
        STANDARD.encode(s)
    }

    fn store_with(content: &str) -> (TempDir, DockerConfigStore) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("config.json");
        fs::write(&path, content).expect("write config");
        (dir, DockerConfigStore::with_path(path))
    }

    #[test]
    fn lookup_decodes_credentials() {
        let content = format!(
            r#"{{"auths": {{"registry.example.com": {{"auth": "{}"}}}}}}"#,
            encode("alice:secret")
        );
        let (_dir, store) = store_with(&content);

        let creds = store.lookup("registry.example.com").unwrap();
        assert_eq!(creds, Credentials::new("alice", "secret"));
    }

    #[test]
    fn password_may_contain_colons() {
        let content = format!(
            r#"{{"auths": {{"r.io": {{"auth": "{}"}}}}}}"#,
            encode("bob:pa:ss")
        );
        let (_dir, store) = store_with(&content);

        let creds = store.lookup("r.io").unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn other_top_level_keys_ignored() {
        let content = format!(
            r#"{{"auths": {{"r.io": {{"auth": "{}", "email": "a@b.c"}}}}, "credsStore": "desktop"}}"#,
            encode("a:b")
        );
        let (_dir, store) = store_with(&content);
        assert!(store.lookup("r.io").is_ok());
    }

    #[test]
    fn missing_file() {
        let dir = TempDir::new().unwrap();
        let store = DockerConfigStore::with_path(dir.path().join("absent.json"));
        let err = store.lookup("r.io").unwrap_err();
        assert!(matches!(err, CredentialError::FileMissing { .. }));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let (_dir, store) = store_with("{not json");
        let err = store.lookup("r.io").unwrap_err();
        assert!(matches!(err, CredentialError::FileMalformed { .. }));
    }

    #[test]
    fn missing_auths_is_malformed() {
        let (_dir, store) = store_with(r#"{"credsStore": "desktop"}"#);
        let err = store.lookup("r.io").unwrap_err();
        match err {
            CredentialError::FileMalformed { message, .. } => assert!(message.contains("auths")),
            other => panic!("expected FileMalformed, got {:?}", other),
        }
    }

    #[test]
    fn auths_of_wrong_type_is_malformed() {
        let (_dir, store) = store_with(r#"{"auths": ["r.io"]}"#);
        assert!(matches!(
            store.lookup("r.io"),
            Err(CredentialError::FileMalformed { .. })
        ));
    }

    #[test]
    fn unknown_domain() {
        let content = format!(
            r#"{{"auths": {{"other.io": {{"auth": "{}"}}}}}}"#,
            encode("a:b")
        );
        let (_dir, store) = store_with(&content);
        let err = store.lookup("r.io").unwrap_err();
        assert!(
            matches!(err, CredentialError::NoCredentialsForDomain { ref domain, .. } if domain == "r.io")
        );
    }

    #[test]
    fn entry_without_auth_is_malformed() {
        let (_dir, store) = store_with(r#"{"auths": {"r.io": {}}}"#);
        let err = store.lookup("r.io").unwrap_err();
        assert!(matches!(err, CredentialError::FileMalformed { .. }));
    }

    #[test]
    fn invalid_base64_is_decode_error() {
        let (_dir, store) = store_with(r#"{"auths": {"r.io": {"auth": "%%%"}}}"#);
        let err = store.lookup("r.io").unwrap_err();
        assert!(matches!(err, CredentialError::Decode { .. }));
    }

    #[test]
    fn missing_separator_is_decode_error() {
        let content = format!(
            r#"{{"auths": {{"r.io": {{"auth": "{}"}}}}}}"#,
            encode("just-a-token")
        );
        let (_dir, store) = store_with(&content);
        let err = store.lookup("r.io").unwrap_err();
        assert!(matches!(err, CredentialError::Decode { .. }));
        assert!(!err.to_string().contains("just-a-token"));
    }

    #[test]
    fn errors_never_contain_secret() {
        let content = format!(
            r#"{{"auths": {{"r.io": {{"auth": "{}"}}}}}}"#,
            encode("alice:topsecret")
        );
        let (_dir, store) = store_with(&content);
        let err = store.lookup("other.io").unwrap_err();
        assert!(!err.to_string().contains("topsecret"));
    }
}
