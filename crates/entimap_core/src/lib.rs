//! # EntiMap Core
//!
//! Alias-aware document mapping with automatic index reconciliation.
//!
//! This crate provides:
//! - Model declarations with serialization aliases and index annotations
//! - Resolution of declarations into index descriptors over stored names
//! - Index diffing and safe, idempotent plan execution
//! - Start-up initialization across registered models
//! - An in-memory document store and typed, alias-aware collections
//!
//! ## Usage
//!
//! ```rust
//! use entimap_core::{FieldSpec, IndexManager, MemoryDatabase, ModelRegistry, ModelSpec, ReconcileConfig};
//!
//! let db = MemoryDatabase::new();
//! let mut registry = ModelRegistry::new();
//! registry
//!     .register(
//!         ModelSpec::new("doc_with_index_alias")
//!             .field(FieldSpec::new("test_field").alias("aliasedIndexField").indexed()),
//!     )
//!     .unwrap();
//!
//! db.init(&registry, &ReconcileConfig::default()).unwrap();
//!
//! let indexes = db.collection("doc_with_index_alias").list_indexes().unwrap();
//! assert!(indexes.iter().any(|i| i.keys[0].field == "aliasedIndexField"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod collection;
mod config;
mod error;
pub mod index;
mod init;
pub mod model;
mod types;

pub use collection::{Collection, Filter, IndexManager, MemoryCollection, MemoryDatabase};
pub use config::ReconcileConfig;
pub use error::{
    CollectionError, CollectionResult, ConfigurationError, CoreError, CoreResult,
    IndexBuildError, IndexOperation,
};
pub use index::{
    execute, plan, reconcile, resolve, DesiredIndexSet, IndexDescriptor, IndexKey, IndexOptions,
    IndexSet, ObservedIndexSet, OptionValue, ReconcileReport, ReconciliationPlan, SortDirection,
    IDENTITY_INDEX_NAME,
};
pub use init::{InitReport, Initializer, ModelRegistry};
pub use model::{DocumentModel, FieldSpec, IndexAnnotation, IndexModel, ModelSpec, RawDocument};
pub use types::DocumentId;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
