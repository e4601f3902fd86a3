//! Typed collection implementation.

use crate::collection::filter::Filter;
use crate::collection::memory::MemoryCollection;
use crate::error::{CoreError, CoreResult};
use crate::model::{from_stored, to_stored, DocumentModel, FieldMap, ModelSpec, ID_FIELD};
use crate::types::DocumentId;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed view of a collection.
///
/// `Collection<T>` encodes documents with their stored field names and
/// translates filters written against model field names, so application
/// code never sees aliases.
///
/// # Example
///
/// ```rust,ignore
/// let docs: Collection<DocumentWithSerializationAlias> = db.typed();
/// docs.insert(&DocumentWithSerializationAlias { test_field: "query_test".into() })?;
///
/// // Model field name; stored as `aliasedField`.
/// let found = docs.find_one(&Filter::eq("test_field", "query_test"))?;
/// ```
pub struct Collection<T: DocumentModel> {
    inner: Arc<MemoryCollection>,
    fields: FieldMap,
    _marker: PhantomData<T>,
}

impl<T: DocumentModel> Collection<T> {
    /// Creates a typed view over `inner` using the declaration `spec`.
    pub fn new(inner: Arc<MemoryCollection>, spec: &ModelSpec) -> Self {
        Self {
            inner,
            fields: FieldMap::new(spec),
            _marker: PhantomData,
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the underlying untyped collection.
    pub fn raw(&self) -> &Arc<MemoryCollection> {
        &self.inner
    }

    /// Inserts a document, returning its id.
    pub fn insert(&self, document: &T) -> CoreResult<DocumentId> {
        let stored = to_stored(document, &self.fields)?;
        self.inner
            .insert_raw(stored)
            .map_err(|e| CoreError::collection(self.name(), e))
    }

    /// Gets a document by id.
    ///
    /// Returns `None` if the document doesn't exist.
    pub fn get(&self, id: DocumentId) -> CoreResult<Option<T>> {
        self.find_one(&Filter::eq(ID_FIELD, id.to_string()))
    }

    /// Returns the first document matching `filter`.
    pub fn find_one(&self, filter: &Filter) -> CoreResult<Option<T>> {
        Ok(self.find(filter)?.into_iter().next())
    }

    /// Returns every document matching `filter`.
    pub fn find(&self, filter: &Filter) -> CoreResult<Vec<T>> {
        let stored = filter.to_stored(&self.fields)?;
        self.inner
            .find_raw(&stored)
            .map_err(|e| CoreError::collection(self.name(), e))?
            .iter()
            .map(|document| from_stored(document, &self.fields))
            .collect()
    }

    /// Counts documents matching `filter`.
    pub fn count(&self, filter: &Filter) -> CoreResult<usize> {
        let stored = filter.to_stored(&self.fields)?;
        self.inner
            .find_raw(&stored)
            .map(|found| found.len())
            .map_err(|e| CoreError::collection(self.name(), e))
    }
}
