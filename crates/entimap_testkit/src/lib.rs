//! # EntiMap Testkit
//!
//! Test utilities for EntiMap.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - A recording, fault-injecting collection handle
//! - Property-based test generators using proptest
//! - Concurrent start-up stress helpers
//!
//! ## Usage
//!
//! ```rust
//! use entimap_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     let registry = registry(vec![aliased_index_model("doc", "aliasedField")]);
//!     db.init(&registry, &Default::default()).unwrap();
//!     assert_eq!(key_fields(&*db.collection("doc")), vec!["aliasedField"]);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod recording;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::recording::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use recording::*;
pub use stress::*;
