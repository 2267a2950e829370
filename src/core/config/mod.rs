//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! kubedeploy has two configuration scopes:
//! - **Global**: User-level settings (default registry, credential provider, deadlines)
//! - **Service**: Per-service settings in `.kubedeploy.toml`
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Service config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$KUBEDEPLOY_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/kubedeploy/config.toml`
//! 3. `~/.kubedeploy/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use kubedeploy::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Path::new("/srv/api")).unwrap();
//! let config = result.config;
//!
//! println!("Namespace: {}", config.namespace());
//! println!("Service: {}", config.service_name());
//! ```

pub mod schema;

pub use schema::{CredentialsConfig, GlobalConfig, NetworkConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// File name of the per-service config.
pub const SERVICE_CONFIG_FILE: &str = ".kubedeploy.toml";

/// File name used by older releases (YAML); detected only to warn.
const LEGACY_SERVICE_CONFIG_FILE: &str = ".kubedeploy";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules: service config overrides
/// global config, which overrides built-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Service configuration (if `.kubedeploy.toml` exists)
    pub repo: Option<RepoConfig>,
    /// Directory the service config was looked up in
    work_dir: PathBuf,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration for a service directory from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(work_dir: &Path) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(Self::find_global().as_deref(), work_dir)
    }

    /// Load configuration using an explicit global config path.
    ///
    /// `global_path` of `None`, or a path that does not exist, means defaults.
    pub fn load_from(
        global_path: Option<&Path>,
        work_dir: &Path,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = match global_path {
            Some(path) if path.exists() => {
                (read_toml::<GlobalConfig>(path)?, Some(path.to_path_buf()))
            }
            _ => (GlobalConfig::default(), None),
        };

        let service_path = work_dir.join(SERVICE_CONFIG_FILE);
        let repo = if service_path.exists() {
            Some(read_toml::<RepoConfig>(&service_path)?)
        } else {
            let legacy = work_dir.join(LEGACY_SERVICE_CONFIG_FILE);
            if legacy.is_file() {
                warnings.push(ConfigWarning {
                    message: format!(
                        "Ignoring legacy config file. Convert it to TOML at '{}'",
                        service_path.display()
                    ),
                    path: legacy,
                });
            }
            None
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                work_dir: work_dir.to_path_buf(),
                global_path,
            },
            warnings,
        })
    }

    /// Locate the global config file, if any exists.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("KUBEDEPLOY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("kubedeploy/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".kubedeploy/config.toml"))
            .filter(|path| path.exists())
    }

    /// Path of the global config file that was loaded, if any.
    pub fn global_path(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Registry domain, if configured anywhere.
    pub fn registry(&self) -> Option<&str> {
        self.repo
            .as_ref()
            .and_then(|r| r.registry.as_deref())
            .or(self.global.registry.as_deref())
    }

    /// Service name, defaulting to the last component of the working directory.
    pub fn service_name(&self) -> String {
        if let Some(name) = self.repo.as_ref().and_then(|r| r.service_name.as_deref()) {
            return name.to_string();
        }
        self.work_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "service".to_string())
    }

    /// Image repository name, defaulting to the service name.
    pub fn image(&self) -> String {
        self.repo
            .as_ref()
            .and_then(|r| r.image.clone())
            .unwrap_or_else(|| self.service_name())
    }

    /// Kubernetes namespace, defaulting to `default`.
    pub fn namespace(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.namespace.as_deref())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Branch to deploy when none is given on the command line.
    pub fn branch(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.branch.as_deref())
    }

    /// Environment suffix for the deployment name.
    pub fn environment(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.environment.as_deref())
    }

    /// Credential provider name, defaulting to `docker-config`.
    pub fn credentials_provider(&self) -> &str {
        self.global
            .credentials
            .as_ref()
            .and_then(|c| c.provider.as_deref())
            .unwrap_or(crate::credentials::DEFAULT_PROVIDER)
    }

    /// Explicit credential file path, if configured.
    pub fn credentials_path(&self) -> Option<&Path> {
        self.global
            .credentials
            .as_ref()
            .and_then(|c| c.path.as_deref())
    }

    /// Deadline for each remote fetch.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.global
            .network
            .as_ref()
            .and_then(|n| n.fetch_timeout_secs)
            .map(Duration::from_secs)
    }

    /// Deadline for each registry request.
    pub fn registry_timeout(&self) -> Option<Duration> {
        self.global
            .network
            .as_ref()
            .and_then(|n| n.registry_timeout_secs)
            .map(Duration::from_secs)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
