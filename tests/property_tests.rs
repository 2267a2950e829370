//! Property-based tests for image tags and commit ids.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use kubedeploy::core::tag::{build, parse, Tag, TagError};
use kubedeploy::core::types::{Oid, ShortId};
use kubedeploy::deploy::deployment_name;

/// Registry domains: no `/`, may carry a port.
fn domain() -> impl Strategy<Value = String> {
    "[a-z0-9.-]{1,20}(:[0-9]{2,5})?"
}

/// Repository names: may be nested with `/`, never contain `:`.
fn repository() -> impl Strategy<Value = String> {
    "[a-z0-9_.-]{1,12}(/[a-z0-9_.-]{1,12}){0,2}"
}

/// Versions: anything printable, including `:` and `/`.
fn version() -> impl Strategy<Value = String> {
    "[ -~]{0,30}"
}

/// Strategy for generating valid hex OIDs.
fn valid_oid_string() -> impl Strategy<Value = String> {
    "[0-9a-f]{40}"
}

proptest! {
    /// parse(build(d, r, v)) == (d, r, v)
    #[test]
    fn tag_round_trip(d in domain(), r in repository(), v in version()) {
        let tag = parse(&build(&d, &r, &v)).unwrap();
        prop_assert_eq!(tag, Tag::new(d, r, v));
    }

    /// build(parse(s)) == s for every parseable string.
    #[test]
    fn tag_reparse_is_identity(s in "[ -~]{0,40}") {
        if let Ok(tag) = parse(&s) {
            prop_assert_eq!(build(&tag.domain, &tag.repository, &tag.version), s.clone());
            prop_assert_eq!(tag.to_string(), s);
        }
    }

    /// Strings without a `/` never parse.
    #[test]
    fn tag_without_slash_is_malformed(s in "[^/]{0,40}") {
        let is_missing_slash = matches!(parse(&s), Err(TagError::Malformed { missing: '/', .. }));
        prop_assert!(is_missing_slash);
    }

    /// A `/` without a later `:` never parses.
    #[test]
    fn tag_without_version_is_malformed(d in "[a-z.]{1,10}", rest in "[^:]{0,30}") {
        let s = format!("{}/{}", d, rest);
        let is_missing_colon = matches!(parse(&s), Err(TagError::Malformed { missing: ':', .. }));
        prop_assert!(is_missing_colon);
    }

    /// The default short id is the first eight characters of the oid.
    #[test]
    fn short_id_from_oid(hex in valid_oid_string()) {
        let oid = Oid::new(&hex).unwrap();
        let short = ShortId::from_oid(&oid);
        prop_assert_eq!(short.as_str(), &hex[..ShortId::MIN_LEN]);
    }

    /// Deployment names keep the service name as a prefix.
    #[test]
    fn deployment_name_prefix(service in "[a-z]{1,10}", env in proptest::option::of("[a-z]{1,8}")) {
        let name = deployment_name(&service, env.as_deref());
        prop_assert!(name.starts_with(&service));
        match env {
            Some(env) => prop_assert_eq!(name, format!("{}-{}", service, env)),
            None => prop_assert_eq!(name, service),
        }
    }
}
