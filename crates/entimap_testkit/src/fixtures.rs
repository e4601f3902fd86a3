//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common model declarations.

use entimap_core::{
    FieldSpec, IndexDescriptor, IndexManager, MemoryDatabase, ModelRegistry, ModelSpec,
    IDENTITY_INDEX_NAME,
};

/// A test database.
pub struct TestDatabase {
    /// The database instance.
    pub db: MemoryDatabase,
}

impl TestDatabase {
    /// Creates a new empty test database.
    pub fn new() -> Self {
        Self {
            db: MemoryDatabase::new(),
        }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = MemoryDatabase;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a fresh in-memory database.
///
/// # Example
///
/// ```rust
/// use entimap_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     assert!(db.collection_names().is_empty());
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&MemoryDatabase) -> R,
{
    let test_db = TestDatabase::new();
    f(&test_db.db)
}

/// A model with one aliased, ascending-indexed field named `field`.
pub fn aliased_index_model(collection: &str, alias: &str) -> ModelSpec {
    ModelSpec::new(collection).field(FieldSpec::new("field").alias(alias).indexed())
}

/// A model with one aliased field and no index.
pub fn aliased_model(collection: &str, alias: &str) -> ModelSpec {
    ModelSpec::new(collection).field(FieldSpec::new("field").alias(alias))
}

/// Builds a registry, panicking on invalid declarations.
pub fn registry(specs: Vec<ModelSpec>) -> ModelRegistry {
    ModelRegistry::from_specs(specs).expect("Invalid model declarations")
}

/// Returns the non-identity indexes of a collection.
pub fn managed_indexes(handle: &dyn IndexManager) -> Vec<IndexDescriptor> {
    handle
        .list_indexes()
        .expect("Failed to list indexes")
        .into_iter()
        .filter(|d| d.name != IDENTITY_INDEX_NAME)
        .collect()
}

/// Returns every key field of the non-identity indexes, in order.
pub fn key_fields(handle: &dyn IndexManager) -> Vec<String> {
    managed_indexes(handle)
        .into_iter()
        .flat_map(|d| d.keys.into_iter().map(|k| k.field))
        .collect()
}

/// Returns the names of the non-identity indexes, sorted.
pub fn index_names(handle: &dyn IndexManager) -> Vec<String> {
    let mut names: Vec<String> = managed_indexes(handle).into_iter().map(|d| d.name).collect();
    names.sort();
    names
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use entimap_core::ReconcileConfig;

    /// A database whose collection was initialized under `alias`, as if by
    /// a previous application version.
    pub fn previously_initialized(collection: &str, alias: &str) -> TestDatabase {
        let test_db = TestDatabase::new();
        test_db
            .init(
                &registry(vec![aliased_index_model(collection, alias)]),
                &ReconcileConfig::default(),
            )
            .expect("Failed to initialize database");
        test_db
    }
}
