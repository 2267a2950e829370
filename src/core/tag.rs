//! core::tag
//!
//! Image tags of the form `domain/repository:version`.
//!
//! # Format
//!
//! A tag is split on the **first** `/` into the registry domain and the rest,
//! then the rest is split on the **first** `:` into repository and version.
//! The repository may itself contain `/` (e.g. `team/api`), the version may
//! contain `:`.
//!
//! Building is plain formatting with no validation. Parsing a built tag gives
//! back the original parts whenever the domain has no `/` and the repository
//! has no `:`.
//!
//! # Example
//!
//! ```
//! use kubedeploy::core::tag::{build, parse, Tag};
//!
//! let s = build("registry.example.com", "team/api", "abc12345");
//! assert_eq!(s, "registry.example.com/team/api:abc12345");
//!
//! let tag = parse(&s).unwrap();
//! assert_eq!(tag, Tag::new("registry.example.com", "team/api", "abc12345"));
//! assert_eq!(tag.to_string(), s);
//! ```

use std::str::FromStr;

use thiserror::Error;

/// Errors from tag parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TagError {
    /// The tag lacks the `/` after the domain or the `:` before the version.
    #[error("malformed image tag '{tag}': missing '{missing}'")]
    Malformed {
        /// The offending tag string
        tag: String,
        /// The separator that was not found
        missing: char,
    },
}

/// A three-part image identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Registry domain (e.g. `registry.example.com` or `localhost:5000`)
    pub domain: String,
    /// Repository within the registry (e.g. `team/api`)
    pub repository: String,
    /// Version, usually a short commit id
    pub version: String,
}

impl Tag {
    /// Create a tag from its parts.
    pub fn new(
        domain: impl Into<String>,
        repository: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            repository: repository.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.domain, self.repository, self.version)
    }
}

impl FromStr for Tag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Format a tag string from its parts.
pub fn build(domain: &str, repository: &str, version: &str) -> String {
    format!("{domain}/{repository}:{version}")
}

/// Split a tag string into its parts.
///
/// # Errors
///
/// Returns [`TagError::Malformed`] if there is no `/`, or no `:` after it.
pub fn parse(tag: &str) -> Result<Tag, TagError> {
    let (domain, rest) = tag.split_once('/').ok_or_else(|| TagError::Malformed {
        tag: tag.to_string(),
        missing: '/',
    })?;
    let (repository, version) = rest.split_once(':').ok_or_else(|| TagError::Malformed {
        tag: tag.to_string(),
        missing: ':',
    })?;

    Ok(Tag::new(domain, repository, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_formats_parts() {
        assert_eq!(
            build("registry.example.com", "api", "abc12345"),
            "registry.example.com/api:abc12345"
        );
    }

    #[test]
    fn parse_simple_tag() {
        let tag = parse("registry.example.com/api:abc12345").unwrap();
        assert_eq!(tag.domain, "registry.example.com");
        assert_eq!(tag.repository, "api");
        assert_eq!(tag.version, "abc12345");
    }

    #[test]
    fn parse_nested_repository() {
        let tag = parse("registry.example.com/team/api:v1").unwrap();
        assert_eq!(tag.domain, "registry.example.com");
        assert_eq!(tag.repository, "team/api");
        assert_eq!(tag.version, "v1");
    }

    #[test]
    fn parse_domain_with_port() {
        // The port colon sits before the first '/', so it stays in the domain
        let tag = parse("localhost:5000/api:abc12345").unwrap();
        assert_eq!(tag.domain, "localhost:5000");
        assert_eq!(tag.repository, "api");
        assert_eq!(tag.version, "abc12345");
    }

    #[test]
    fn parse_version_keeps_extra_colons() {
        let tag = parse("r.io/api:a:b").unwrap();
        assert_eq!(tag.repository, "api");
        assert_eq!(tag.version, "a:b");
    }

    #[test]
    fn parse_empty_version() {
        let tag = parse("r.io/api:").unwrap();
        assert_eq!(tag.version, "");
    }

    #[test]
    fn missing_slash_is_malformed() {
        assert_eq!(
            parse("api:abc12345"),
            Err(TagError::Malformed {
                tag: "api:abc12345".into(),
                missing: '/',
            })
        );
    }

    #[test]
    fn missing_colon_is_malformed() {
        let err = parse("registry.example.com/api").unwrap_err();
        assert!(matches!(err, TagError::Malformed { missing: ':', .. }));
        assert!(err.to_string().contains("registry.example.com/api"));
    }

    #[test]
    fn display_matches_build() {
        let tag = Tag::new("r.io", "team/api", "deadbeef");
        assert_eq!(tag.to_string(), build("r.io", "team/api", "deadbeef"));
    }

    #[test]
    fn from_str_delegates_to_parse() {
        let tag: Tag = "r.io/api:1".parse().unwrap();
        assert_eq!(tag, Tag::new("r.io", "api", "1"));
        assert!("nope".parse::<Tag>().is_err());
    }
}
