//! In-memory document store.

use crate::collection::filter::{lookup, Filter};
use crate::collection::handle::IndexManager;
use crate::collection::typed::Collection;
use crate::config::ReconcileConfig;
use crate::error::{CollectionError, CollectionResult, CoreResult};
use crate::index::{IndexDescriptor, OptionValue, IDENTITY_FIELD, IDENTITY_INDEX_NAME};
use crate::init::{InitReport, Initializer, ModelRegistry};
use crate::model::{decode_document, encode_document, DocumentModel, RawDocument};
use crate::types::DocumentId;
use ciborium::Value;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// An in-memory collection of documents with index metadata.
///
/// Documents are kept as CBOR bytes. Indexes are metadata only: unique
/// indexes are enforced on insert and on creation, but queries always
/// scan. A single lock serializes index operations on the collection.
///
/// # Example
///
/// ```rust
/// use entimap_core::{IndexDescriptor, IndexKey, IndexManager, IndexOptions, MemoryCollection};
///
/// let collection = MemoryCollection::new("users");
/// let index = IndexDescriptor::new(vec![IndexKey::ascending("mail")], IndexOptions::new());
/// collection.create_index(&index).unwrap();
/// assert_eq!(collection.list_indexes().unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    state: RwLock<CollectionState>,
}

#[derive(Debug)]
struct CollectionState {
    documents: BTreeMap<DocumentId, Vec<u8>>,
    indexes: Vec<IndexDescriptor>,
}

impl MemoryCollection {
    /// Creates an empty collection carrying only the identity index.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(CollectionState {
                documents: BTreeMap::new(),
                indexes: vec![IndexDescriptor::identity()],
            }),
        }
    }

    /// Creates an empty collection with pre-existing index metadata.
    ///
    /// Useful for restoring a catalog or simulating a previous run. An
    /// index whose name or key pattern is already taken is skipped, the
    /// same way `create_index` would refuse it.
    pub fn with_indexes(
        name: impl Into<String>,
        indexes: impl IntoIterator<Item = IndexDescriptor>,
    ) -> Self {
        let collection = Self::new(name);
        {
            let mut state = collection.state.write();
            for index in indexes {
                if index.is_identity() {
                    continue;
                }
                if let Some(existing) = state
                    .indexes
                    .iter()
                    .find(|i| i.name == index.name || i.same_keys(&index))
                {
                    warn!(
                        collection = %collection.name,
                        index = %index.name,
                        existing = %existing.name,
                        "skipping index that collides with an existing one"
                    );
                    continue;
                }
                state.indexes.push(index);
            }
        }
        collection
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a stored document.
    ///
    /// A missing or null `_id` is assigned a fresh [`DocumentId`].
    pub fn insert_raw(&self, mut document: RawDocument) -> CollectionResult<DocumentId> {
        let id = match document.get(IDENTITY_FIELD) {
            None | Some(Value::Null) => {
                let id = DocumentId::new();
                document.insert(IDENTITY_FIELD.to_string(), Value::Text(id.to_string()));
                id
            }
            Some(Value::Text(text)) => DocumentId::parse(text)
                .ok_or_else(|| CollectionError::codec(format!("invalid document id: {}", text)))?,
            Some(_) => return Err(CollectionError::codec("document id must be text")),
        };

        let mut state = self.state.write();
        if state.documents.contains_key(&id) {
            return Err(CollectionError::DuplicateKey {
                index: IDENTITY_INDEX_NAME.to_string(),
                key: id.to_string(),
            });
        }

        for index in state.indexes.iter().filter(|i| i.options.is_unique()) {
            let Some(key) = unique_key(index, &document)? else {
                continue;
            };
            for bytes in state.documents.values() {
                let existing = decode_document(bytes)?;
                if unique_key(index, &existing)?.as_ref() == Some(&key) {
                    return Err(duplicate_key(index, &document));
                }
            }
        }

        let bytes = encode_document(&document)?;
        state.documents.insert(id, bytes);
        Ok(id)
    }

    /// Returns a stored document by id.
    pub fn get_raw(&self, id: DocumentId) -> CollectionResult<Option<RawDocument>> {
        let state = self.state.read();
        state
            .documents
            .get(&id)
            .map(|bytes| decode_document(bytes))
            .transpose()
    }

    /// Returns stored documents matching a filter over stored names.
    pub fn find_raw(&self, filter: &Filter) -> CollectionResult<Vec<RawDocument>> {
        let state = self.state.read();
        let mut found = Vec::new();
        for bytes in state.documents.values() {
            let document = decode_document(bytes)?;
            if filter.matches(&document) {
                found.push(document);
            }
        }
        Ok(found)
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    /// Returns true if the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_unique(
        documents: &BTreeMap<DocumentId, Vec<u8>>,
        index: &IndexDescriptor,
    ) -> CollectionResult<()> {
        let mut seen = HashSet::new();
        for bytes in documents.values() {
            let document = decode_document(bytes)?;
            if let Some(key) = unique_key(index, &document)? {
                if !seen.insert(key) {
                    return Err(duplicate_key(index, &document));
                }
            }
        }
        Ok(())
    }
}

impl IndexManager for MemoryCollection {
    fn collection_name(&self) -> &str {
        &self.name
    }

    fn list_indexes(&self) -> CollectionResult<Vec<IndexDescriptor>> {
        Ok(self.state.read().indexes.clone())
    }

    fn create_index(&self, descriptor: &IndexDescriptor) -> CollectionResult<()> {
        if descriptor.keys.is_empty() {
            return Err(CollectionError::invalid_index(
                &descriptor.name,
                "key pattern is empty",
            ));
        }

        let mut state = self.state.write();
        if let Some(existing) = state.indexes.iter().find(|i| i.name == descriptor.name) {
            if existing.same_definition(descriptor) {
                return Err(CollectionError::index_already_exists(&descriptor.name));
            }
            return Err(CollectionError::index_conflict(
                &descriptor.name,
                format!("an index named `{}` has a different definition", existing.name),
            ));
        }
        if let Some(existing) = state.indexes.iter().find(|i| i.same_keys(descriptor)) {
            return Err(CollectionError::index_conflict(
                &descriptor.name,
                format!("index `{}` already covers the same keys", existing.name),
            ));
        }

        if descriptor.options.is_unique() {
            Self::check_unique(&state.documents, descriptor)?;
        }
        state.indexes.push(descriptor.clone());
        Ok(())
    }

    fn drop_index(&self, name: &str) -> CollectionResult<()> {
        if name == IDENTITY_INDEX_NAME {
            return Err(CollectionError::invalid_index(
                name,
                "the identity index cannot be dropped",
            ));
        }

        let mut state = self.state.write();
        let position = state
            .indexes
            .iter()
            .position(|i| i.name == name)
            .ok_or_else(|| CollectionError::index_not_found(name))?;
        state.indexes.remove(position);
        Ok(())
    }
}

/// Computes the encoded key a unique index holds for a document.
///
/// Returns `None` when the index does not cover the document: a sparse
/// index skips documents missing every key field, and a partial index
/// skips documents not matching its filter.
fn unique_key(index: &IndexDescriptor, document: &RawDocument) -> CollectionResult<Option<Vec<u8>>> {
    if let Some(expression) = index.options.partial_filter_expression() {
        if !partial_match(expression, document) {
            return Ok(None);
        }
    }

    let values: Vec<Option<&Value>> = index.fields().map(|f| lookup(document, f)).collect();
    if index.options.is_sparse() && values.iter().all(Option::is_none) {
        return Ok(None);
    }

    let key: Vec<Value> = values
        .into_iter()
        .map(|v| v.cloned().unwrap_or(Value::Null))
        .collect();
    let mut bytes = Vec::new();
    ciborium::into_writer(&key, &mut bytes).map_err(|e| CollectionError::codec(e.to_string()))?;
    Ok(Some(bytes))
}

/// Equality-only evaluation of a partial filter expression. Operator
/// entries are not evaluated and never exclude a document.
fn partial_match(expression: &BTreeMap<String, OptionValue>, document: &RawDocument) -> bool {
    expression
        .iter()
        .filter(|(field, _)| !field.starts_with('$'))
        .all(|(field, expected)| match expected {
            OptionValue::Document(_) => true,
            scalar => lookup(document, field) == Some(&to_value(scalar)),
        })
}

fn to_value(option: &OptionValue) -> Value {
    match option {
        OptionValue::Bool(b) => Value::Bool(*b),
        OptionValue::Integer(i) => Value::from(*i),
        OptionValue::Text(t) => Value::Text(t.clone()),
        OptionValue::Array(items) => Value::Array(items.iter().map(to_value).collect()),
        OptionValue::Document(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (Value::Text(k.clone()), to_value(v)))
                .collect(),
        ),
    }
}

fn duplicate_key(index: &IndexDescriptor, document: &RawDocument) -> CollectionError {
    let key: Vec<String> = index
        .fields()
        .map(|f| match lookup(document, f) {
            Some(value) => format!("{:?}", value),
            None => "null".to_string(),
        })
        .collect();
    CollectionError::DuplicateKey {
        index: index.name.clone(),
        key: format!("[{}]", key.join(", ")),
    }
}

/// An in-memory database: a set of named collections.
///
/// # Example
///
/// ```rust
/// use entimap_core::{FieldSpec, MemoryDatabase, ModelRegistry, ModelSpec, ReconcileConfig};
///
/// let db = MemoryDatabase::new();
/// let mut registry = ModelRegistry::new();
/// registry
///     .register(ModelSpec::new("doc").field(FieldSpec::new("f").alias("aliasedField").indexed()))
///     .unwrap();
///
/// let report = db.init(&registry, &ReconcileConfig::default()).unwrap();
/// assert_eq!(report.created_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    collections: RwLock<BTreeMap<String, Arc<MemoryCollection>>>,
}

impl MemoryDatabase {
    /// Creates an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a collection, creating it on first use.
    pub fn collection(&self, name: &str) -> Arc<MemoryCollection> {
        if let Some(existing) = self.collections.read().get(name) {
            return Arc::clone(existing);
        }
        let mut collections = self.collections.write();
        Arc::clone(
            collections
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryCollection::new(name))),
        )
    }

    /// Returns a collection if it exists.
    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<MemoryCollection>> {
        self.collections.read().get(name).cloned()
    }

    /// Adds or replaces a collection.
    pub fn insert_collection(&self, collection: MemoryCollection) -> Arc<MemoryCollection> {
        let collection = Arc::new(collection);
        self.collections
            .write()
            .insert(collection.name().to_string(), Arc::clone(&collection));
        collection
    }

    /// Returns the collection names in order.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    /// Returns a typed view of the collection declared by `T`.
    pub fn typed<T: DocumentModel>(&self) -> Collection<T> {
        let spec = T::model_spec();
        Collection::new(self.collection(&spec.collection), &spec)
    }

    /// Reconciles the indexes of every registered model.
    pub fn init(&self, registry: &ModelRegistry, config: &ReconcileConfig) -> CoreResult<InitReport> {
        Initializer::new(registry, config.clone()).run(|name| {
            let handle: Arc<dyn IndexManager> = self.collection(name);
            handle
        })
    }
}
