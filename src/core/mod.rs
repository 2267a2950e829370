//! core
//!
//! Domain types, image tags, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, ShortId
//! - [`tag`] - The `domain/repository:version` image tag codec
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Parsing failures are typed, never silently defaulted

pub mod config;
pub mod tag;
pub mod types;
