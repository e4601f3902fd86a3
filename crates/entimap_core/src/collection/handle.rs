//! Index-management handle trait.

use crate::error::CollectionResult;
use crate::index::IndexDescriptor;
use std::sync::Arc;

/// Index metadata operations of one collection.
///
/// This is everything reconciliation needs from a database. Implementations
/// must report the two "already in the desired state" outcomes with
/// distinct errors so callers can tolerate them:
///
/// - dropping a missing index returns
///   [`CollectionError::IndexNotFound`](crate::CollectionError::IndexNotFound)
/// - creating an index identical to an existing one returns
///   [`CollectionError::IndexAlreadyExists`](crate::CollectionError::IndexAlreadyExists)
pub trait IndexManager: Send + Sync {
    /// Returns the collection name.
    fn collection_name(&self) -> &str;

    /// Lists the indexes currently materialized, identity index included.
    fn list_indexes(&self) -> CollectionResult<Vec<IndexDescriptor>>;

    /// Creates an index.
    fn create_index(&self, descriptor: &IndexDescriptor) -> CollectionResult<()>;

    /// Drops an index by name.
    fn drop_index(&self, name: &str) -> CollectionResult<()>;
}

impl<T: IndexManager + ?Sized> IndexManager for Arc<T> {
    fn collection_name(&self) -> &str {
        (**self).collection_name()
    }

    fn list_indexes(&self) -> CollectionResult<Vec<IndexDescriptor>> {
        (**self).list_indexes()
    }

    fn create_index(&self, descriptor: &IndexDescriptor) -> CollectionResult<()> {
        (**self).create_index(descriptor)
    }

    fn drop_index(&self, name: &str) -> CollectionResult<()> {
        (**self).drop_index(name)
    }
}
