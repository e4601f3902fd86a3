//! Property-based test generators using proptest.
//!
//! Provides strategies for generating model declarations and index
//! metadata that maintain the invariants the resolver requires: stored
//! names are unique within a model and never collide with the identity
//! field.

use entimap_core::index::{IndexKey, IndexOptions, SortDirection};
use entimap_core::{FieldSpec, IndexAnnotation, IndexDescriptor, ModelSpec};
use proptest::prelude::*;

/// Strategy for generating valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating stored field names.
pub fn stored_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z0-9]{1,11}")
        .expect("Invalid regex")
        .prop_filter("Stored name must not shadow the identity field", |s| {
            s != "id"
        })
}

/// Strategy for single-field index directions.
pub fn direction_strategy() -> impl Strategy<Value = SortDirection> {
    prop_oneof![
        4 => Just(SortDirection::Ascending),
        2 => Just(SortDirection::Descending),
        1 => Just(SortDirection::Hashed),
    ]
}

/// Strategy for an optional field-level index annotation.
pub fn annotation_strategy() -> impl Strategy<Value = Option<IndexAnnotation>> {
    prop::option::weighted(
        0.7,
        (direction_strategy(), any::<bool>()).prop_map(|(direction, unique)| {
            let annotation = IndexAnnotation::new(direction);
            if unique && direction != SortDirection::Hashed {
                annotation.unique()
            } else {
                annotation
            }
        }),
    )
}

/// Strategy for a model over `collection` with 1 to 6 fields.
///
/// Model field names are `f0`, `f1`, ... and every field is aliased to a
/// distinct stored name, so the model names never appear in stored keys.
pub fn model_spec_strategy(collection: String) -> impl Strategy<Value = ModelSpec> {
    prop::collection::btree_set(stored_name_strategy(), 1..6)
        .prop_flat_map(|aliases| {
            let aliases: Vec<String> = aliases.into_iter().collect();
            let annotations = prop::collection::vec(annotation_strategy(), aliases.len());
            (Just(aliases), annotations)
        })
        .prop_map(move |(aliases, annotations)| {
            aliases
                .into_iter()
                .zip(annotations)
                .enumerate()
                .fold(ModelSpec::new(collection.clone()), |spec, (i, (alias, index))| {
                    let field = FieldSpec::new(format!("f{i}")).alias(alias);
                    spec.field(match index {
                        Some(annotation) => field.index(annotation),
                        None => field,
                    })
                })
        })
}

/// Strategy for a model whose aliases are renamed in a second version.
///
/// Both versions index every field ascending. The renamed aliases never
/// reuse an alias of the first version.
pub fn alias_change_strategy(collection: String) -> impl Strategy<Value = (ModelSpec, ModelSpec)> {
    prop::collection::btree_set(stored_name_strategy(), 2..10).prop_map(move |names| {
        let names: Vec<String> = names.into_iter().collect();
        let half = names.len() / 2;
        let (before, after) = names.split_at(half);
        let build = |aliases: &[String]| {
            aliases
                .iter()
                .enumerate()
                .fold(ModelSpec::new(collection.clone()), |spec, (i, alias)| {
                    spec.field(FieldSpec::new(format!("f{i}")).alias(alias).indexed())
                })
        };
        (build(before), build(&after[..half]))
    })
}

/// Strategy for index metadata a collection might already carry.
pub fn descriptor_strategy() -> impl Strategy<Value = IndexDescriptor> {
    (
        prop::collection::btree_set(stored_name_strategy(), 1..3),
        direction_strategy(),
        any::<bool>(),
    )
        .prop_map(|(fields, direction, unique)| {
            let keys = fields
                .into_iter()
                .map(|field| IndexKey::new(field, direction))
                .collect();
            let options = if unique {
                IndexOptions::new().unique()
            } else {
                IndexOptions::new()
            };
            IndexDescriptor::new(keys, options)
        })
}

/// Strategy for a collection's pre-existing, non-identity indexes.
pub fn observed_indexes_strategy() -> impl Strategy<Value = Vec<IndexDescriptor>> {
    prop::collection::vec(descriptor_strategy(), 0..5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{index_names, key_fields, managed_indexes};
    use entimap_core::{reconcile, resolve, IndexSet, MemoryCollection, ReconcileConfig};

    proptest! {
        #[test]
        fn generated_models_resolve(spec in model_spec_strategy("things".into())) {
            let desired = resolve(&spec);
            prop_assert!(desired.is_ok());
        }

        #[test]
        fn reconcile_is_idempotent(
            spec in model_spec_strategy("things".into()),
            existing in observed_indexes_strategy(),
        ) {
            let desired = resolve(&spec).unwrap();
            let collection = MemoryCollection::with_indexes("things", existing);
            let config = ReconcileConfig::default();

            reconcile(&collection, &desired, &config).unwrap();
            let second = reconcile(&collection, &desired, &config).unwrap();

            prop_assert!(second.plan.is_empty());
            prop_assert!(second.is_noop());
            prop_assert_eq!(second.plan.unchanged.len(), desired.len());
        }

        #[test]
        fn observed_matches_desired_after_reconcile(
            spec in model_spec_strategy("things".into()),
            existing in observed_indexes_strategy(),
        ) {
            let desired = resolve(&spec).unwrap();
            let collection = MemoryCollection::with_indexes("things", existing);

            reconcile(&collection, &desired, &ReconcileConfig::default()).unwrap();

            let observed = IndexSet::from_descriptors(managed_indexes(&collection));
            prop_assert!(observed.equivalent(&desired));
        }

        #[test]
        fn keys_use_stored_names(spec in model_spec_strategy("things".into())) {
            let desired = resolve(&spec).unwrap();
            let collection = MemoryCollection::new("things");
            reconcile(&collection, &desired, &ReconcileConfig::default()).unwrap();

            let fields = key_fields(&collection);
            for field in &spec.fields {
                prop_assert!(!fields.contains(&field.name));
                if field.index.is_some() {
                    prop_assert!(fields.iter().any(|f| f == field.stored_name()));
                }
            }
        }

        #[test]
        fn renamed_alias_never_coexists(
            (before, after) in alias_change_strategy("things".into()),
        ) {
            let collection = MemoryCollection::new("things");
            let config = ReconcileConfig::default();

            reconcile(&collection, &resolve(&before).unwrap(), &config).unwrap();
            reconcile(&collection, &resolve(&after).unwrap(), &config).unwrap();

            let fields = key_fields(&collection);
            for old in &before.fields {
                prop_assert!(!fields.iter().any(|f| f == old.stored_name()));
            }
            for new in &after.fields {
                prop_assert!(fields.iter().any(|f| f == new.stored_name()));
            }
        }

        #[test]
        fn keep_unmanaged_retains_foreign_indexes(
            spec in model_spec_strategy("things".into()),
            existing in observed_indexes_strategy(),
        ) {
            let desired = resolve(&spec).unwrap();
            let collection = MemoryCollection::with_indexes("things", existing);
            let config = ReconcileConfig::default().prune_unmanaged(false);

            let report = reconcile(&collection, &desired, &config).unwrap();

            let names = index_names(&collection);
            for retained in &report.plan.retained {
                prop_assert!(names.contains(retained));
            }
            for declared in desired.names() {
                prop_assert!(names.iter().any(|n| n == declared));
            }
        }
    }
}
