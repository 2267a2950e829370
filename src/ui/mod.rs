//! ui
//!
//! User-facing console output.
//!
//! # Modules
//!
//! - [`output`] - Progress lines, warnings, and errors

pub mod output;
