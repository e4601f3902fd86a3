//! Alias-aware document encoding.

use crate::error::{CollectionError, CollectionResult, CoreError, CoreResult};
use crate::model::{FieldMap, ModelSpec};
use ciborium::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// A document as it is stored: stored field names to CBOR values.
pub type RawDocument = BTreeMap<String, Value>;

/// Trait for types that can be stored as documents.
///
/// The declaration returned by `model_spec()` is the single source of
/// truth for the collection name, aliases and indexes.
///
/// # Example
///
/// ```rust
/// use entimap_core::{DocumentModel, FieldSpec, ModelSpec};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Account {
///     email: String,
/// }
///
/// impl DocumentModel for Account {
///     fn model_spec() -> ModelSpec {
///         ModelSpec::new("accounts").field(FieldSpec::new("email").alias("mail").indexed())
///     }
/// }
/// ```
pub trait DocumentModel: Serialize + DeserializeOwned {
    /// Returns the model declaration.
    fn model_spec() -> ModelSpec;
}

/// Serializes a value and renames its fields to stored names.
///
/// Fields the map does not know keep their names.
pub fn to_stored<T: Serialize>(value: &T, map: &FieldMap) -> CoreResult<RawDocument> {
    let value = Value::serialized(value).map_err(|e| CoreError::codec(e.to_string()))?;
    let entries = match value {
        Value::Map(entries) => entries,
        _ => return Err(CoreError::codec("document must serialize to a map")),
    };

    let mut document = RawDocument::new();
    for (key, value) in entries {
        let name = key
            .into_text()
            .map_err(|_| CoreError::codec("document keys must be text"))?;
        let stored = map.stored_name(&name).map_or(name.clone(), str::to_string);
        document.insert(stored, value);
    }
    Ok(document)
}

/// Renames stored fields back to model names and deserializes.
pub fn from_stored<T: DeserializeOwned>(document: &RawDocument, map: &FieldMap) -> CoreResult<T> {
    let entries = document
        .iter()
        .map(|(stored, value)| {
            let name = map.model_name(stored).unwrap_or(stored);
            (Value::Text(name.to_string()), value.clone())
        })
        .collect();
    Value::Map(entries)
        .deserialized()
        .map_err(|e| CoreError::codec(e.to_string()))
}

/// Encodes a stored document to CBOR bytes.
pub fn encode_document(document: &RawDocument) -> CollectionResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(document, &mut bytes)
        .map_err(|e| CollectionError::codec(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a stored document from CBOR bytes.
pub fn decode_document(bytes: &[u8]) -> CollectionResult<RawDocument> {
    ciborium::from_reader(bytes).map_err(|e| CollectionError::codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldSpec;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Aliased {
        test_field: String,
        count: i64,
    }

    fn map() -> FieldMap {
        FieldMap::new(
            &ModelSpec::new("doc_with_alias")
                .field(FieldSpec::new("test_field").alias("aliasedField"))
                .field(FieldSpec::new("count")),
        )
    }

    #[test]
    fn stored_document_uses_alias() {
        let doc = to_stored(
            &Aliased {
                test_field: "test".into(),
                count: 3,
            },
            &map(),
        )
        .unwrap();

        assert_eq!(doc.get("aliasedField"), Some(&Value::Text("test".into())));
        assert!(!doc.contains_key("test_field"));
        assert!(doc.contains_key("count"));
    }

    #[test]
    fn stored_document_reads_back() {
        let original = Aliased {
            test_field: "back".into(),
            count: 7,
        };
        let doc = to_stored(&original, &map()).unwrap();
        let bytes = encode_document(&doc).unwrap();
        let decoded: Aliased = from_stored(&decode_document(&bytes).unwrap(), &map()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn non_map_values_are_rejected() {
        let err = to_stored(&42i64, &map()).unwrap_err();
        assert!(matches!(err, CoreError::Codec { .. }));
    }
}
