//! registry
//!
//! Read access to container image registries.
//!
//! # Architecture
//!
//! - [`Registry`] / [`RegistrySession`]: async traits for opening an
//!   authenticated session and listing a repository's tags
//! - [`HttpRegistry`]: Docker Registry HTTP API v2 implementation
//! - [`mock::MockRegistry`]: in-memory implementation for tests
//! - [`RegistryProbe`]: answers "does this tag exist?" using a
//!   [`CredentialStore`](crate::credentials::CredentialStore) and a `Registry`

pub mod http;
pub mod mock;
mod probe;
mod traits;

pub use http::HttpRegistry;
pub use probe::RegistryProbe;
pub use traits::{Registry, RegistryError, RegistrySession};
