//! Resolution of model declarations into desired index sets.
//!
//! Every key in a resolved descriptor names a stored field: an index is
//! built on the name present in stored documents, which is the alias when
//! one is declared.

use crate::error::ConfigurationError;
use crate::index::descriptor::{generated_name, IndexDescriptor, IndexKey, IndexSet};
use crate::index::options::{IndexOptions, OptionValue, PARTIAL_FILTER_EXPRESSION};
use crate::index::{IDENTITY_FIELD, IDENTITY_INDEX_NAME};
use crate::model::{FieldMap, IndexModel, ModelSpec};
use std::collections::BTreeMap;

/// Resolves a model declaration into its desired index set.
///
/// Field-level indexes come first in declaration order, followed by
/// model-level indexes. Identical duplicate declarations collapse into one;
/// two names over one key pattern, or an index duplicating the identity
/// index, are rejected.
pub fn resolve(spec: &ModelSpec) -> Result<IndexSet, ConfigurationError> {
    let collection = spec.collection.as_str();
    if collection.is_empty() || collection.starts_with("system.") || collection.contains('$') {
        return Err(ConfigurationError::InvalidCollectionName {
            name: collection.to_string(),
        });
    }

    validate_fields(spec)?;
    let map = FieldMap::new(spec);

    let mut desired = IndexSet::new();
    for field in &spec.fields {
        let Some(annotation) = &field.index else {
            continue;
        };
        let stored = map
            .stored_name(&field.name)
            .unwrap_or_else(|| field.stored_name());
        if stored == IDENTITY_FIELD {
            return Err(ConfigurationError::IdentityIndex {
                collection: collection.to_string(),
                field: field.name.clone(),
            });
        }
        let keys = vec![IndexKey::new(stored, annotation.direction)];
        let options = resolve_options(collection, &annotation.options, &map)?;
        let descriptor = build(collection, annotation.name.as_deref(), keys, options)?;
        add(collection, &mut desired, descriptor)?;
    }

    for model in &spec.indexes {
        let descriptor = resolve_model(collection, model, &map)?;
        add(collection, &mut desired, descriptor)?;
    }

    Ok(desired)
}

fn validate_fields(spec: &ModelSpec) -> Result<(), ConfigurationError> {
    let collection = &spec.collection;
    let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();
    for field in &spec.fields {
        for name in std::iter::once(field.name.as_str()).chain(field.alias.as_deref()) {
            if name.is_empty() || name.starts_with('$') || name.contains('.') {
                return Err(ConfigurationError::InvalidFieldName {
                    collection: collection.clone(),
                    field: name.to_string(),
                });
            }
        }

        let stored = field.stored_name();
        if let Some(first) = claimed.insert(stored, field.name.as_str()) {
            return Err(ConfigurationError::DuplicateStoredName {
                collection: collection.clone(),
                stored_name: stored.to_string(),
                first: first.to_string(),
                second: field.name.clone(),
            });
        }
    }
    Ok(())
}

fn resolve_model(
    collection: &str,
    model: &IndexModel,
    map: &FieldMap,
) -> Result<IndexDescriptor, ConfigurationError> {
    let keys = model
        .keys
        .iter()
        .map(|key| {
            let field = map.resolve(&key.field).ok_or_else(|| {
                ConfigurationError::UnresolvedField {
                    collection: collection.to_string(),
                    field: key.field.clone(),
                }
            })?;
            Ok(IndexKey::new(field, key.direction))
        })
        .collect::<Result<Vec<_>, ConfigurationError>>()?;
    let options = resolve_options(collection, &model.options, map)?;
    build(collection, model.name.as_deref(), keys, options)
}

fn build(
    collection: &str,
    name: Option<&str>,
    keys: Vec<IndexKey>,
    options: IndexOptions,
) -> Result<IndexDescriptor, ConfigurationError> {
    if keys.is_empty() {
        return Err(ConfigurationError::EmptyKeyPattern {
            collection: collection.to_string(),
            name: name.unwrap_or("<unnamed>").to_string(),
        });
    }

    let name = name.map_or_else(|| generated_name(&keys), str::to_string);
    if name == IDENTITY_INDEX_NAME {
        return Err(ConfigurationError::ReservedIndexName {
            collection: collection.to_string(),
            name,
        });
    }

    Ok(IndexDescriptor::named(name, keys, options))
}

/// Maps field references inside a partial filter expression to stored names.
fn resolve_options(
    collection: &str,
    options: &IndexOptions,
    map: &FieldMap,
) -> Result<IndexOptions, ConfigurationError> {
    let Some(filter) = options.partial_filter_expression() else {
        return Ok(options.clone());
    };
    let resolved = resolve_filter(collection, filter, map)?;
    let mut options = options.clone();
    options.set(PARTIAL_FILTER_EXPRESSION, resolved);
    Ok(options)
}

fn resolve_filter(
    collection: &str,
    filter: &BTreeMap<String, OptionValue>,
    map: &FieldMap,
) -> Result<BTreeMap<String, OptionValue>, ConfigurationError> {
    let mut resolved = BTreeMap::new();
    for (key, value) in filter {
        if key.starts_with('$') {
            // Operators such as `$and` hold nested expressions.
            let value = match value {
                OptionValue::Array(items) => OptionValue::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            OptionValue::Document(doc) => {
                                resolve_filter(collection, doc, map).map(OptionValue::Document)
                            }
                            other => Ok(other.clone()),
                        })
                        .collect::<Result<_, _>>()?,
                ),
                other => other.clone(),
            };
            resolved.insert(key.clone(), value);
            continue;
        }

        let field = map
            .resolve(key)
            .ok_or_else(|| ConfigurationError::UnresolvedField {
                collection: collection.to_string(),
                field: key.clone(),
            })?;
        resolved.insert(field, value.clone());
    }
    Ok(resolved)
}

fn add(
    collection: &str,
    desired: &mut IndexSet,
    descriptor: IndexDescriptor,
) -> Result<(), ConfigurationError> {
    if let Some(existing) = desired.get(&descriptor.name) {
        if existing.same_definition(&descriptor) {
            return Ok(());
        }
        return Err(ConfigurationError::AmbiguousIndex {
            collection: collection.to_string(),
            name: descriptor.name,
        });
    }
    if descriptor.same_keys(&IndexDescriptor::identity()) {
        return Err(ConfigurationError::IdentityIndex {
            collection: collection.to_string(),
            field: IDENTITY_FIELD.to_string(),
        });
    }
    // The store refuses a second index over the same keys.
    if let Some(existing) = desired.iter().find(|d| d.same_keys(&descriptor)) {
        return Err(ConfigurationError::DuplicateKeyPattern {
            collection: collection.to_string(),
            first: existing.name.clone(),
            second: descriptor.name,
        });
    }
    desired.insert(descriptor);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SortDirection;
    use crate::model::{FieldSpec, IndexAnnotation};

    #[test]
    fn index_uses_alias() {
        let spec = ModelSpec::new("doc_with_index_alias")
            .field(FieldSpec::new("test_field").alias("aliasedIndexField").indexed());
        let desired = resolve(&spec).unwrap();

        assert_eq!(desired.len(), 1);
        let index = desired.get("aliasedIndexField_1").unwrap();
        assert_eq!(index.keys, vec![IndexKey::ascending("aliasedIndexField")]);
        assert!(index.fields().all(|f| f != "test_field"));
    }

    #[test]
    fn unaliased_field_uses_own_name() {
        let spec = ModelSpec::new("c").field(
            FieldSpec::new("score").index(IndexAnnotation::new(SortDirection::Descending)),
        );
        let desired = resolve(&spec).unwrap();
        assert_eq!(desired.names(), vec!["score_-1"]);
    }

    #[test]
    fn explicit_name_wins() {
        let spec = ModelSpec::new("c").field(
            FieldSpec::new("email")
                .alias("mail")
                .index(IndexAnnotation::default().unique().name("by_mail")),
        );
        let desired = resolve(&spec).unwrap();
        let index = desired.get("by_mail").unwrap();
        assert!(index.options.is_unique());
        assert_eq!(index.keys, vec![IndexKey::ascending("mail")]);
    }

    #[test]
    fn compound_index_resolves_model_and_stored_names() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("first").alias("f"))
            .field(FieldSpec::new("address").alias("addr"))
            .index(IndexModel::new(vec![
                IndexKey::ascending("first"),
                IndexKey::new("addr", SortDirection::Descending),
                IndexKey::ascending("address.city"),
            ]));
        let desired = resolve(&spec).unwrap();
        let index = desired.iter().next().unwrap();
        assert_eq!(index.name, "f_1_addr_-1_addr.city_1");
    }

    #[test]
    fn unresolved_field_fails() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a"))
            .index(IndexModel::new(vec![IndexKey::ascending("b")]));
        assert_eq!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::UnresolvedField {
                collection: "c".into(),
                field: "b".into(),
            }
        );
    }

    #[test]
    fn ambiguous_names_fail() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a").indexed())
            .index(IndexModel::new(vec![IndexKey::ascending("a")]).options(IndexOptions::new().unique()));
        assert!(matches!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::AmbiguousIndex { name, .. } if name == "a_1"
        ));
    }

    #[test]
    fn identical_duplicates_collapse() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a").indexed())
            .index(IndexModel::new(vec![IndexKey::ascending("a")]));
        assert_eq!(resolve(&spec).unwrap().len(), 1);
    }

    #[test]
    fn id_field_index_is_rejected() {
        let spec = ModelSpec::new("with_id")
            .field(FieldSpec::new("id").indexed())
            .field(FieldSpec::new("name"));
        assert_eq!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::IdentityIndex {
                collection: "with_id".into(),
                field: "id".into(),
            }
        );
    }

    #[test]
    fn field_aliased_to_identity_cannot_be_indexed() {
        let spec = ModelSpec::new("c").field(
            FieldSpec::new("key")
                .alias(IDENTITY_FIELD)
                .index(IndexAnnotation::new(SortDirection::Descending)),
        );
        assert!(matches!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::IdentityIndex { field, .. } if field == "key"
        ));
    }

    #[test]
    fn model_index_on_identity_key_is_rejected() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a"))
            .index(IndexModel::new(vec![IndexKey::ascending("id")]).name("by_id"));
        assert!(matches!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::IdentityIndex { .. }
        ));
    }

    #[test]
    fn compound_index_may_include_identity() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a").alias("x"))
            .index(IndexModel::new(vec![
                IndexKey::ascending("a"),
                IndexKey::ascending("id"),
            ]));
        assert_eq!(resolve(&spec).unwrap().names(), vec!["x_1__id_1"]);
    }

    #[test]
    fn shared_key_pattern_under_two_names_fails() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a").alias("x").indexed())
            .index(IndexModel::new(vec![IndexKey::ascending("a")]).name("by_x"));
        assert_eq!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::DuplicateKeyPattern {
                collection: "c".into(),
                first: "x_1".into(),
                second: "by_x".into(),
            }
        );
    }

    #[test]
    fn empty_key_pattern_fails() {
        let spec = ModelSpec::new("c").index(IndexModel::new(Vec::new()).name("nothing"));
        assert!(matches!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::EmptyKeyPattern { .. }
        ));
    }

    #[test]
    fn duplicate_stored_names_fail() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a").alias("x"))
            .field(FieldSpec::new("x"));
        assert!(matches!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::DuplicateStoredName { stored_name, .. } if stored_name == "x"
        ));
    }

    #[test]
    fn invalid_names_fail() {
        let spec = ModelSpec::new("c").field(FieldSpec::new("a").alias("$bad"));
        assert!(matches!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::InvalidFieldName { .. }
        ));
        assert!(matches!(
            resolve(&ModelSpec::new("")).unwrap_err(),
            ConfigurationError::InvalidCollectionName { .. }
        ));
    }

    #[test]
    fn identity_name_is_reserved() {
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("a").index(IndexAnnotation::default().name(IDENTITY_INDEX_NAME)));
        assert!(matches!(
            resolve(&spec).unwrap_err(),
            ConfigurationError::ReservedIndexName { .. }
        ));
    }

    #[test]
    fn partial_filter_fields_are_aliased() {
        let mut filter = BTreeMap::new();
        filter.insert("status".to_string(), OptionValue::from("active"));
        let spec = ModelSpec::new("c")
            .field(FieldSpec::new("status").alias("st"))
            .field(
                FieldSpec::new("email").index(
                    IndexAnnotation::default()
                        .options(IndexOptions::new().unique().partial_filter(filter)),
                ),
            );
        let desired = resolve(&spec).unwrap();
        let expression = desired
            .get("email_1")
            .and_then(|d| d.options.partial_filter_expression())
            .unwrap();
        assert!(expression.contains_key("st"));
        assert!(!expression.contains_key("status"));
    }
}
