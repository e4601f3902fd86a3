//! A collection handle that records calls and injects failures.
//!
//! Wraps any [`IndexManager`] so tests can assert which operations
//! reconciliation issued, in what order, and how it reacts to database
//! errors.

use entimap_core::{CollectionError, CollectionResult, IndexDescriptor, IndexManager};
use parking_lot::Mutex;
use std::collections::HashMap;

/// One call made through a [`RecordingCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexCall {
    /// `list_indexes`.
    List,
    /// `create_index` with the index name.
    Create(String),
    /// `drop_index` with the index name.
    Drop(String),
}

/// Records every call and optionally fails chosen operations.
pub struct RecordingCollection<H: IndexManager> {
    inner: H,
    calls: Mutex<Vec<IndexCall>>,
    create_failures: Mutex<HashMap<String, CollectionError>>,
    drop_failures: Mutex<HashMap<String, CollectionError>>,
}

impl<H: IndexManager> RecordingCollection<H> {
    /// Wraps a handle.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            create_failures: Mutex::new(HashMap::new()),
            drop_failures: Mutex::new(HashMap::new()),
        }
    }

    /// Makes `create_index` for `name` fail with `error` instead of
    /// reaching the wrapped handle.
    pub fn fail_create(&self, name: impl Into<String>, error: CollectionError) {
        self.create_failures.lock().insert(name.into(), error);
    }

    /// Makes `drop_index` for `name` fail with `error` instead of
    /// reaching the wrapped handle.
    pub fn fail_drop(&self, name: impl Into<String>, error: CollectionError) {
        self.drop_failures.lock().insert(name.into(), error);
    }

    /// Returns the calls made so far.
    pub fn calls(&self) -> Vec<IndexCall> {
        self.calls.lock().clone()
    }

    /// Returns only the create and drop calls.
    pub fn mutations(&self) -> Vec<IndexCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, IndexCall::List))
            .cloned()
            .collect()
    }

    /// Forgets recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Returns the wrapped handle.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: IndexManager> IndexManager for RecordingCollection<H> {
    fn collection_name(&self) -> &str {
        self.inner.collection_name()
    }

    fn list_indexes(&self) -> CollectionResult<Vec<IndexDescriptor>> {
        self.calls.lock().push(IndexCall::List);
        self.inner.list_indexes()
    }

    fn create_index(&self, descriptor: &IndexDescriptor) -> CollectionResult<()> {
        self.calls
            .lock()
            .push(IndexCall::Create(descriptor.name.clone()));
        if let Some(error) = self.create_failures.lock().get(&descriptor.name) {
            return Err(error.clone());
        }
        self.inner.create_index(descriptor)
    }

    fn drop_index(&self, name: &str) -> CollectionResult<()> {
        self.calls.lock().push(IndexCall::Drop(name.to_string()));
        if let Some(error) = self.drop_failures.lock().get(name) {
            return Err(error.clone());
        }
        self.inner.drop_index(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{aliased_index_model, index_names};
    use entimap_core::{reconcile, resolve, CoreError, MemoryCollection, ReconcileConfig};

    #[test]
    fn second_reconcile_issues_no_mutations() {
        let handle = RecordingCollection::new(MemoryCollection::new("c"));
        let desired = resolve(&aliased_index_model("c", "aliasedField")).unwrap();
        let config = ReconcileConfig::default();

        reconcile(&handle, &desired, &config).unwrap();
        assert_eq!(
            handle.mutations(),
            vec![IndexCall::Create("aliasedField_1".into())]
        );

        handle.clear();
        let report = reconcile(&handle, &desired, &config).unwrap();
        assert!(report.is_noop());
        assert_eq!(handle.calls(), vec![IndexCall::List]);
    }

    #[test]
    fn alias_change_drops_before_creating() {
        let handle = RecordingCollection::new(MemoryCollection::with_indexes(
            "c",
            resolve(&aliased_index_model("c", "alias1")).unwrap(),
        ));
        let desired = resolve(&aliased_index_model("c", "alias2")).unwrap();

        reconcile(&handle, &desired, &ReconcileConfig::default()).unwrap();
        assert_eq!(
            handle.mutations(),
            vec![
                IndexCall::Drop("alias1_1".into()),
                IndexCall::Create("alias2_1".into()),
            ]
        );
        assert_eq!(index_names(handle.inner()), vec!["alias2_1"]);
    }

    #[test]
    fn concurrent_drop_is_tolerated() {
        let handle = RecordingCollection::new(MemoryCollection::with_indexes(
            "c",
            resolve(&aliased_index_model("c", "alias1")).unwrap(),
        ));
        handle.fail_drop("alias1_1", CollectionError::index_not_found("alias1_1"));
        let desired = resolve(&aliased_index_model("c", "alias2")).unwrap();

        let report = reconcile(&handle, &desired, &ReconcileConfig::default()).unwrap();
        assert_eq!(report.tolerated, vec!["alias1_1"]);
        assert_eq!(report.created, vec!["alias2_1"]);
    }

    #[test]
    fn concurrent_create_is_tolerated() {
        let handle = RecordingCollection::new(MemoryCollection::new("c"));
        handle.fail_create(
            "aliasedField_1",
            CollectionError::index_already_exists("aliasedField_1"),
        );
        let desired = resolve(&aliased_index_model("c", "aliasedField")).unwrap();

        let report = reconcile(&handle, &desired, &ReconcileConfig::default()).unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.tolerated, vec!["aliasedField_1"]);
    }

    #[test]
    fn backend_failure_surfaces_index_name() {
        let handle = RecordingCollection::new(MemoryCollection::new("c"));
        handle.fail_create("aliasedField_1", CollectionError::backend("disk full"));
        let desired = resolve(&aliased_index_model("c", "aliasedField")).unwrap();

        let err = reconcile(&handle, &desired, &ReconcileConfig::default()).unwrap_err();
        match err {
            CoreError::IndexBuild(build) => {
                assert_eq!(build.index_name, "aliasedField_1");
                assert_eq!(build.source, CollectionError::backend("disk full"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn list_failure_is_a_collection_error() {
        struct Unreachable;

        impl IndexManager for Unreachable {
            fn collection_name(&self) -> &str {
                "down"
            }
            fn list_indexes(&self) -> CollectionResult<Vec<IndexDescriptor>> {
                Err(CollectionError::backend("connection refused"))
            }
            fn create_index(&self, _: &IndexDescriptor) -> CollectionResult<()> {
                Ok(())
            }
            fn drop_index(&self, _: &str) -> CollectionResult<()> {
                Ok(())
            }
        }

        let handle = RecordingCollection::new(Unreachable);
        let desired = resolve(&aliased_index_model("down", "a")).unwrap();
        let err = reconcile(&handle, &desired, &ReconcileConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::Collection { collection, .. } if collection == "down"));
        assert_eq!(handle.mutations(), Vec::new());
    }
}
