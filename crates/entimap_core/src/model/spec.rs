//! Model declarations.

use crate::index::{IndexKey, IndexOptions, SortDirection};
use serde::{Deserialize, Serialize};

/// An index declared on a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexAnnotation {
    /// Direction or index type.
    #[serde(default)]
    pub direction: SortDirection,
    /// Index options.
    #[serde(default)]
    pub options: IndexOptions,
    /// Explicit index name; generated from the key when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IndexAnnotation {
    /// Creates an annotation with the given direction.
    #[must_use]
    pub fn new(direction: SortDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.options = self.options.unique();
        self
    }

    /// Replaces the index options.
    #[must_use]
    pub fn options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Gives the index an explicit name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One declared field of a document model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Name used by application code.
    pub name: String,
    /// Name used in stored documents, when it differs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Index declared on this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexAnnotation>,
}

impl FieldSpec {
    /// Declares a plain field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            index: None,
        }
    }

    /// Stores the field under `alias`.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an ascending index on the field.
    #[must_use]
    pub fn indexed(self) -> Self {
        self.index(IndexAnnotation::default())
    }

    /// Adds an index on the field.
    #[must_use]
    pub fn index(mut self, annotation: IndexAnnotation) -> Self {
        self.index = Some(annotation);
        self
    }

    /// The name this field has in stored documents.
    #[must_use]
    pub fn stored_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A model-level index, possibly spanning several fields.
///
/// Keys name fields by model name or stored name; resolution maps them
/// to stored names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexModel {
    /// Ordered key pattern over field references.
    pub keys: Vec<IndexKey>,
    /// Index options.
    #[serde(default)]
    pub options: IndexOptions,
    /// Explicit index name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IndexModel {
    /// Creates an index model over the given keys.
    #[must_use]
    pub fn new(keys: Vec<IndexKey>) -> Self {
        Self {
            keys,
            options: IndexOptions::new(),
            name: None,
        }
    }

    /// Replaces the index options.
    #[must_use]
    pub fn options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Gives the index an explicit name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Declaration of a document model bound to one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Collection the documents live in.
    pub collection: String,
    /// Declared fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Model-level indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexModel>,
}

impl ModelSpec {
    /// Starts a declaration for `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a model-level index.
    #[must_use]
    pub fn index(mut self, index: IndexModel) -> Self {
        self.indexes.push(index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_name_prefers_alias() {
        assert_eq!(FieldSpec::new("test_field").stored_name(), "test_field");
        assert_eq!(
            FieldSpec::new("test_field").alias("aliasedField").stored_name(),
            "aliasedField"
        );
    }

    #[test]
    fn parses_json_declaration() {
        let json = r#"{
            "collection": "doc_with_index_alias",
            "fields": [
                {"name": "test_field", "alias": "aliasedIndexField", "index": {}},
                {"name": "other"}
            ],
            "indexes": [
                {"keys": [{"field": "test_field"}, {"field": "other", "direction": -1}],
                 "options": {"unique": true}}
            ]
        }"#;
        let spec: ModelSpec = serde_json::from_str(json).unwrap();

        let expected = ModelSpec::new("doc_with_index_alias")
            .field(FieldSpec::new("test_field").alias("aliasedIndexField").indexed())
            .field(FieldSpec::new("other"))
            .index(
                IndexModel::new(vec![
                    IndexKey::ascending("test_field"),
                    IndexKey::new("other", SortDirection::Descending),
                ])
                .options(IndexOptions::new().unique()),
            );
        assert_eq!(spec, expected);
    }
}
