//! Integration tests for serialization aliases and alias-aware indexes.

use ciborium::Value;
use entimap_core::{
    DocumentModel, FieldSpec, Filter, IndexManager, MemoryDatabase, ModelRegistry, ModelSpec,
    ReconcileConfig, SortDirection, IDENTITY_INDEX_NAME,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DocumentWithSerializationAlias {
    test_field: String,
}

impl DocumentModel for DocumentWithSerializationAlias {
    fn model_spec() -> ModelSpec {
        ModelSpec::new("doc_with_alias").field(FieldSpec::new("test_field").alias("aliasedField"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DocumentWithIndexAndAlias {
    test_field: String,
}

impl DocumentModel for DocumentWithIndexAndAlias {
    fn model_spec() -> ModelSpec {
        ModelSpec::new("doc_with_index_alias")
            .field(FieldSpec::new("test_field").alias("aliasedIndexField").indexed())
    }
}

fn init<T: DocumentModel>(db: &MemoryDatabase) {
    let mut registry = ModelRegistry::new();
    registry.register_model::<T>().unwrap();
    db.init(&registry, &ReconcileConfig::default()).unwrap();
}

fn alias_model(alias: &str) -> ModelSpec {
    ModelSpec::new("doc_alias_change").field(FieldSpec::new("field").alias(alias).indexed())
}

fn key_fields(db: &MemoryDatabase, collection: &str) -> Vec<String> {
    db.collection(collection)
        .list_indexes()
        .unwrap()
        .into_iter()
        .flat_map(|index| index.keys.into_iter().map(|k| k.field))
        .collect()
}

#[test]
fn serialization_alias_persistence() {
    let db = MemoryDatabase::new();
    init::<DocumentWithSerializationAlias>(&db);

    let docs = db.typed::<DocumentWithSerializationAlias>();
    let id = docs
        .insert(&DocumentWithSerializationAlias {
            test_field: "test".into(),
        })
        .unwrap();

    let raw = db
        .collection("doc_with_alias")
        .get_raw(id)
        .unwrap()
        .expect("stored document");
    assert_eq!(raw.get("aliasedField"), Some(&Value::Text("test".into())));
    assert!(!raw.contains_key("test_field"));
}

#[test]
fn serialization_alias_query() {
    let db = MemoryDatabase::new();
    init::<DocumentWithSerializationAlias>(&db);

    let docs = db.typed::<DocumentWithSerializationAlias>();
    docs.insert(&DocumentWithSerializationAlias {
        test_field: "query_test".into(),
    })
    .unwrap();

    let found = docs
        .find_one(&Filter::eq("test_field", "query_test"))
        .unwrap()
        .expect("document found by model field name");
    assert_eq!(found.test_field, "query_test");
}

#[test]
fn index_creation_with_alias() {
    let db = MemoryDatabase::new();
    init::<DocumentWithIndexAndAlias>(&db);

    let indexes = db
        .collection("doc_with_index_alias")
        .list_indexes()
        .unwrap();
    let managed: Vec<_> = indexes
        .iter()
        .filter(|i| i.name != IDENTITY_INDEX_NAME)
        .collect();

    assert_eq!(managed.len(), 1);
    assert_eq!(managed[0].keys.len(), 1);
    assert_eq!(managed[0].keys[0].field, "aliasedIndexField");
    assert_eq!(managed[0].keys[0].direction, SortDirection::Ascending);
}

#[test]
fn index_recreation_on_alias_change() {
    let db = MemoryDatabase::new();
    let config = ReconcileConfig::default();

    let v1 = ModelRegistry::from_specs(vec![alias_model("alias1")]).unwrap();
    db.init(&v1, &config).unwrap();
    let fields = key_fields(&db, "doc_alias_change");
    assert!(fields.iter().any(|f| f == "alias1"));

    let v2 = ModelRegistry::from_specs(vec![alias_model("alias2")]).unwrap();
    db.init(&v2, &config).unwrap();
    let fields = key_fields(&db, "doc_alias_change");
    assert!(fields.iter().any(|f| f == "alias2"));
    assert!(!fields.iter().any(|f| f == "alias1"));
}

#[test]
fn repeated_init_is_idempotent() {
    let db = MemoryDatabase::new();
    let registry = ModelRegistry::from_specs(vec![alias_model("aliasedField")]).unwrap();
    let config = ReconcileConfig::default();

    db.init(&registry, &config).unwrap();
    let second = db.init(&registry, &config).unwrap();

    let report = second.get("doc_alias_change").unwrap();
    assert!(report.plan.to_create.is_empty());
    assert!(report.plan.to_drop.is_empty());
    assert_eq!(report.plan.unchanged, vec!["aliasedField_1"]);
}

#[test]
fn documents_survive_index_rebuild() {
    let db = MemoryDatabase::new();
    let config = ReconcileConfig::default();
    db.init(&ModelRegistry::from_specs(vec![alias_model("alias1")]).unwrap(), &config)
        .unwrap();

    let collection = db.collection("doc_alias_change");
    collection
        .insert_raw(
            [("alias1".to_string(), Value::Text("kept".into()))]
                .into_iter()
                .collect(),
        )
        .unwrap();

    db.init(&ModelRegistry::from_specs(vec![alias_model("alias2")]).unwrap(), &config)
        .unwrap();
    assert_eq!(collection.len(), 1);
}

#[test]
fn index_on_identity_field_fails_before_touching_database() {
    let db = MemoryDatabase::new();
    let registry = ModelRegistry::from_specs(vec![
        alias_model("aliasedField"),
        ModelSpec::new("with_id")
            .field(FieldSpec::new("id").indexed())
            .field(FieldSpec::new("name")),
    ])
    .unwrap();

    let err = db.init(&registry, &ReconcileConfig::default()).unwrap_err();
    assert!(err.is_configuration());
    assert!(db.collection_names().is_empty());
}
