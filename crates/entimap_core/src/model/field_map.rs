//! Model-name to stored-name mapping.

use crate::index::IDENTITY_FIELD;
use crate::model::ModelSpec;
use std::collections::HashMap;

/// Model name of the identity field.
pub const ID_FIELD: &str = "id";

/// Bidirectional mapping between model field names and stored names.
///
/// The identity field is always present as `id` <-> `_id`.
#[derive(Debug, Clone)]
pub struct FieldMap {
    collection: String,
    to_stored: HashMap<String, String>,
    to_model: HashMap<String, String>,
}

impl FieldMap {
    /// Builds the mapping for a model.
    ///
    /// If two fields claim the same stored name, the first wins; the
    /// resolver rejects such declarations before they reach storage.
    #[must_use]
    pub fn new(spec: &ModelSpec) -> Self {
        let mut map = Self {
            collection: spec.collection.clone(),
            to_stored: HashMap::new(),
            to_model: HashMap::new(),
        };
        map.add(ID_FIELD, IDENTITY_FIELD);
        for field in &spec.fields {
            map.add(&field.name, field.stored_name());
        }
        map
    }

    fn add(&mut self, model: &str, stored: &str) {
        self.to_stored
            .entry(model.to_string())
            .or_insert_with(|| stored.to_string());
        self.to_model
            .entry(stored.to_string())
            .or_insert_with(|| model.to_string());
    }

    /// Returns the collection this map belongs to.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the stored name of a model field.
    #[must_use]
    pub fn stored_name(&self, model: &str) -> Option<&str> {
        self.to_stored.get(model).map(String::as_str)
    }

    /// Returns the model name of a stored field.
    #[must_use]
    pub fn model_name(&self, stored: &str) -> Option<&str> {
        self.to_model.get(stored).map(String::as_str)
    }

    /// Resolves a field reference to a stored path.
    ///
    /// The reference may be a model name or a stored name. For dotted
    /// paths only the first segment is mapped.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let (head, rest) = match reference.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (reference, None),
        };
        let stored = self
            .stored_name(head)
            .or_else(|| self.to_model.contains_key(head).then_some(head))?;
        Some(match rest {
            Some(rest) => format!("{}.{}", stored, rest),
            None => stored.to_string(),
        })
    }
}
