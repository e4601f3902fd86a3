//! Models and index catalog files.
//!
//! A models file is a JSON array of model declarations. A catalog file
//! is a JSON object mapping each collection name to the array of indexes
//! it currently carries. The identity index may be listed or left out.

use entimap_core::{
    IndexDescriptor, IndexManager, MemoryCollection, MemoryDatabase, ModelRegistry, ModelSpec,
};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Index metadata per collection.
pub type Catalog = BTreeMap<String, Vec<IndexDescriptor>>;

/// Errors reading or writing CLI input files.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON of the expected shape.
    #[error("{}: {source}", .path.display())]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl FileError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads model declarations and registers them.
pub fn load_registry(path: &Path) -> Result<ModelRegistry, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| FileError::io(path, e))?;
    let specs: Vec<ModelSpec> = serde_json::from_str(&text).map_err(|e| FileError::json(path, e))?;
    Ok(ModelRegistry::from_specs(specs)?)
}

/// Reads a catalog. A missing file is an empty database.
pub fn load_catalog(path: &Path) -> Result<Catalog, FileError> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).map_err(|e| FileError::json(path, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Catalog::new()),
        Err(e) => Err(FileError::io(path, e)),
    }
}

/// Writes a catalog as pretty-printed JSON.
pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<(), FileError> {
    let text = serde_json::to_string_pretty(catalog).map_err(|e| FileError::json(path, e))?;
    fs::write(path, text + "\n").map_err(|e| FileError::io(path, e))
}

/// Builds a database whose collections carry the catalog's indexes.
pub fn open_database(catalog: &Catalog) -> MemoryDatabase {
    let db = MemoryDatabase::new();
    for (name, indexes) in catalog {
        db.insert_collection(MemoryCollection::with_indexes(
            name.as_str(),
            indexes.iter().cloned(),
        ));
    }
    db
}

/// Reads every collection's index metadata back into a catalog.
pub fn snapshot(db: &MemoryDatabase) -> Result<Catalog, Box<dyn std::error::Error>> {
    let mut catalog = Catalog::new();
    for name in db.collection_names() {
        let indexes = db.collection(&name).list_indexes()?;
        catalog.insert(name, indexes);
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entimap_core::{IndexKey, IndexOptions, IDENTITY_INDEX_NAME};
    use tempfile::tempdir;

    #[test]
    fn missing_catalog_is_empty() {
        let dir = tempdir().unwrap();
        let catalog = load_catalog(&dir.path().join("absent.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn catalog_round_trips_through_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{ "users": [ { "name": "email_1", "keys": [ { "field": "email", "direction": 1 } ], "options": { "unique": true } } ] }"#,
        )
        .unwrap();

        let catalog = load_catalog(&path).unwrap();
        let db = open_database(&catalog);
        let restored = snapshot(&db).unwrap();

        let users = &restored["users"];
        assert_eq!(users[0].name, IDENTITY_INDEX_NAME);
        assert_eq!(
            users[1],
            IndexDescriptor::new(vec![IndexKey::ascending("email")], IndexOptions::new().unique())
        );

        save_catalog(&path, &restored).unwrap();
        assert_eq!(load_catalog(&path).unwrap(), restored);
    }

    #[test]
    fn malformed_models_name_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_registry(&path).unwrap_err();
        assert!(err.to_string().contains("models.json"));
    }

    #[test]
    fn duplicate_collections_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models.json");
        std::fs::write(
            &path,
            r#"[ { "collection": "a", "fields": [] }, { "collection": "a", "fields": [] } ]"#,
        )
        .unwrap();

        assert!(load_registry(&path).is_err());
    }
}
