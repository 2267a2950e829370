//! core::types
//!
//! Strong types for the values that flow between resolution, tagging and
//! deployment.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Full Git object identifier (SHA-1 or SHA-256)
//! - [`ShortId`] - Abbreviated commit id used as the deployable version
//!
//! # Examples
//!
//! ```
//! use kubedeploy::core::types::{BranchName, Oid};
//!
//! let branch = BranchName::new("release/2024-06").unwrap();
//! let oid = Oid::new("abc12345def4567890abc123def4567890abc123").unwrap();
//! assert_eq!(oid.short(8), "abc12345");
//!
//! assert!(BranchName::new("bad..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! # let _ = branch;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid short id: {0}")]
    InvalidShortId(String),
}

/// A validated Git branch name.
///
/// Branch names follow Git's refname rules (see `git check-ref-format`):
/// not empty, not `@`, no leading `.` or `-`, no trailing `/` or `.lock`,
/// no `..`, `@{`, `//`, whitespace, control characters, or any of
/// `~ ^ : \ ? * [`.
///
/// # Example
///
/// ```
/// use kubedeploy::core::types::BranchName;
///
/// let name = BranchName::new("feature/login").unwrap();
/// assert_eq!(name.as_str(), "feature/login");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let reject = |why: &str| Err(TypeError::InvalidBranchName(format!("'{name}': {why}")));

        if name.is_empty() {
            return reject("branch name cannot be empty");
        }
        if name == "@" {
            return reject("'@' is reserved");
        }
        if name.starts_with('-') {
            return reject("cannot start with '-'");
        }
        if name.ends_with('/') {
            return reject("cannot end with '/'");
        }
        for forbidden in ["..", "@{", "//"] {
            if name.contains(forbidden) {
                return reject(&format!("cannot contain '{forbidden}'"));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return reject(&format!("cannot contain '{c}'"));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return reject("cannot contain control characters");
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return reject("path component cannot start with '.'");
            }
            if component.ends_with(".lock") {
                return reject("path component cannot end with '.lock'");
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A full Git object identifier (SHA-1 or SHA-256), normalized to lowercase.
///
/// # Example
///
/// ```
/// use kubedeploy::core::types::Oid;
///
/// let oid = Oid::new("ABC12345DEF4567890ABC123DEF4567890ABC123").unwrap();
/// assert_eq!(oid.as_str(), "abc12345def4567890abc123def4567890abc123");
/// assert_eq!(oid.short(8), "abc12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64
    /// character hex id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get the first `len` characters of the id (the full id if `len` is larger).
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An abbreviated commit id: the version string that names a deployable image.
///
/// At least [`ShortId::MIN_LEN`] hex characters, longer only when the
/// repository needs more characters to keep the prefix unique.
///
/// # Example
///
/// ```
/// use kubedeploy::core::types::{Oid, ShortId};
///
/// let oid = Oid::new("abc12345def4567890abc123def4567890abc123").unwrap();
/// let short = ShortId::from_oid(&oid);
/// assert_eq!(short.as_str(), "abc12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortId(String);

impl ShortId {
    /// Minimum abbreviation length.
    pub const MIN_LEN: usize = 8;

    /// Create a short id from an arbitrary hex prefix.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidShortId` if the prefix is shorter than
    /// [`ShortId::MIN_LEN`] or not hexadecimal.
    pub fn new(prefix: impl Into<String>) -> Result<Self, TypeError> {
        let prefix = prefix.into().to_ascii_lowercase();
        if prefix.len() < Self::MIN_LEN {
            return Err(TypeError::InvalidShortId(format!(
                "'{prefix}' is shorter than {} characters",
                Self::MIN_LEN
            )));
        }
        if !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidShortId(format!(
                "'{prefix}' is not hexadecimal"
            )));
        }
        Ok(Self(prefix))
    }

    /// The minimum-length abbreviation of a full id.
    pub fn from_oid(oid: &Oid) -> Self {
        Self(oid.short(Self::MIN_LEN).to_string())
    }

    /// Get the short id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShortId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ShortId> for String {
    fn from(id: ShortId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "abc12345def4567890abc123def4567890abc123";

    mod branch_name {
        use super::*;

        #[test]
        fn valid_branch_names() {
            assert!(BranchName::new("main").is_ok());
            assert!(BranchName::new("master").is_ok());
            assert!(BranchName::new("release/1.2").is_ok());
            assert!(BranchName::new("user@feature").is_ok());
            assert!(BranchName::new("a/b/c").is_ok());
        }

        #[test]
        fn invalid_branch_names() {
            assert!(BranchName::new("").is_err());
            assert!(BranchName::new("@").is_err());
            assert!(BranchName::new("-flag").is_err());
            assert!(BranchName::new(".hidden").is_err());
            assert!(BranchName::new("foo/.hidden").is_err());
            assert!(BranchName::new("branch.lock").is_err());
            assert!(BranchName::new("trailing/").is_err());
            assert!(BranchName::new("a..b").is_err());
            assert!(BranchName::new("a//b").is_err());
            assert!(BranchName::new("a@{b").is_err());
            assert!(BranchName::new("has space").is_err());
            assert!(BranchName::new("colon:name").is_err());
            assert!(BranchName::new("tab\tname").is_err());
        }

        #[test]
        fn error_names_the_branch() {
            let err = BranchName::new("a..b").unwrap_err();
            assert!(err.to_string().contains("a..b"));
        }

        #[test]
        fn serde_roundtrip() {
            let name = BranchName::new("main").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, "\"main\"");
            let parsed: BranchName = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, name);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<BranchName, _> = serde_json::from_str("\"a..b\"");
            assert!(result.is_err());
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn normalizes_to_lowercase() {
            let oid = Oid::new(SHA.to_uppercase()).unwrap();
            assert_eq!(oid.as_str(), SHA);
        }

        #[test]
        fn accepts_sha256_length() {
            assert!(Oid::new("a".repeat(64)).is_ok());
        }

        #[test]
        fn rejects_wrong_length_and_non_hex() {
            assert!(Oid::new("abc").is_err());
            assert!(Oid::new("g".repeat(40)).is_err());
        }

        #[test]
        fn short_clamps_to_length() {
            let oid = Oid::new(SHA).unwrap();
            assert_eq!(oid.short(8), "abc12345");
            assert_eq!(oid.short(100), SHA);
        }
    }

    mod short_id {
        use super::*;

        #[test]
        fn from_oid_takes_min_len() {
            let oid = Oid::new(SHA).unwrap();
            let short = ShortId::from_oid(&oid);
            assert_eq!(short.as_str(), "abc12345");
        }

        #[test]
        fn longer_prefixes_allowed() {
            let short = ShortId::new("abc12345d").unwrap();
            assert_eq!(short.as_str().len(), 9);
        }

        #[test]
        fn too_short_rejected() {
            assert!(matches!(
                ShortId::new("abc1234"),
                Err(TypeError::InvalidShortId(_))
            ));
        }

        #[test]
        fn non_hex_rejected() {
            assert!(ShortId::new("zzzzzzzz").is_err());
        }
    }
}
