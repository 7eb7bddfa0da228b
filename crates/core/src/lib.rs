//! Bloom Core - Shared types library.
//!
//! This crate provides common types used across all Bloom client components:
//! - `favorites` - Identity-scoped favorites cache and migration
//! - `cli` - Command-line tools for store diagnostics and migration
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no
//! async code. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - User identity, favorite records, and the composite
//!   favorite key

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
