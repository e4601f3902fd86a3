//! Error types for EntiMap core.

use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for operations on a collection handle.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Errors that can occur in EntiMap core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A model declaration could not be turned into indexes.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Creating or dropping an index failed.
    #[error(transparent)]
    IndexBuild(#[from] IndexBuildError),

    /// A collection handle failed outside of index creation or removal.
    #[error("collection `{collection}`: {source}")]
    Collection {
        /// Name of the collection.
        collection: String,
        /// The error reported by the handle.
        #[source]
        source: CollectionError,
    },

    /// A document could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// A filter referenced a field the model does not declare.
    #[error("unknown field `{field}` on collection `{collection}`")]
    UnknownField {
        /// Name of the collection.
        collection: String,
        /// The field that failed to resolve.
        field: String,
    },

    /// Post-reconciliation verification found the collection out of sync.
    #[error("collection `{collection}` still differs from its declared indexes: {details}")]
    Unreconciled {
        /// Name of the collection.
        collection: String,
        /// Summary of the remaining differences.
        details: String,
    },
}

impl CoreError {
    /// Creates a collection error.
    pub fn collection(collection: impl Into<String>, source: CollectionError) -> Self {
        Self::Collection {
            collection: collection.into(),
            source,
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            collection: collection.into(),
            field: field.into(),
        }
    }

    /// Returns true if this error came from a model declaration.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if this error came from creating or dropping an index.
    #[must_use]
    pub fn is_index_build(&self) -> bool {
        matches!(self, Self::IndexBuild(_))
    }
}

/// Declaration-time problems found while resolving a model's indexes.
///
/// These are raised before any call reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// An index references a field that resolves to no stored name.
    #[error("index on collection `{collection}` references unknown field `{field}`")]
    UnresolvedField {
        /// Name of the collection.
        collection: String,
        /// The unresolved field reference.
        field: String,
    },

    /// Two declared indexes share a name but not a definition.
    #[error("collection `{collection}` declares index `{name}` twice with different definitions")]
    AmbiguousIndex {
        /// Name of the collection.
        collection: String,
        /// The contested index name.
        name: String,
    },

    /// Two declared indexes under different names cover the same keys.
    #[error("indexes `{first}` and `{second}` on collection `{collection}` share a key pattern")]
    DuplicateKeyPattern {
        /// Name of the collection.
        collection: String,
        /// Index declared first.
        first: String,
        /// Index declared second.
        second: String,
    },

    /// An index would duplicate the identity index.
    #[error("field `{field}` of collection `{collection}` is stored as `_id`, which only the identity index covers")]
    IdentityIndex {
        /// Name of the collection.
        collection: String,
        /// The field carrying the index.
        field: String,
    },

    /// An index declares no keys.
    #[error("index `{name}` on collection `{collection}` has no keys")]
    EmptyKeyPattern {
        /// Name of the collection.
        collection: String,
        /// Name of the index, or a placeholder when none was given.
        name: String,
    },

    /// Two fields map to the same stored name.
    #[error("fields `{first}` and `{second}` of collection `{collection}` are both stored as `{stored_name}`")]
    DuplicateStoredName {
        /// Name of the collection.
        collection: String,
        /// The shared stored name.
        stored_name: String,
        /// First field declaring it.
        first: String,
        /// Second field declaring it.
        second: String,
    },

    /// A field name or alias cannot appear in a stored document.
    #[error("invalid field name `{field}` on collection `{collection}`")]
    InvalidFieldName {
        /// Name of the collection.
        collection: String,
        /// The offending name.
        field: String,
    },

    /// An index tries to use the identity index name.
    #[error("index name `{name}` on collection `{collection}` is reserved")]
    ReservedIndexName {
        /// Name of the collection.
        collection: String,
        /// The reserved name.
        name: String,
    },

    /// The model has no usable collection name.
    #[error("invalid collection name `{name}`")]
    InvalidCollectionName {
        /// The rejected name.
        name: String,
    },

    /// Two models were registered for one collection.
    #[error("collection `{collection}` is registered more than once")]
    DuplicateCollection {
        /// Name of the collection.
        collection: String,
    },
}

/// The index operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOperation {
    /// Creating an index.
    Create,
    /// Dropping an index.
    Drop,
}

impl fmt::Display for IndexOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Drop => f.write_str("drop"),
        }
    }
}

/// A fatal database error while creating or dropping an index.
#[derive(Debug, Error)]
#[error("failed to {operation} index `{index_name}` on collection `{collection}`: {source}")]
pub struct IndexBuildError {
    /// Name of the collection.
    pub collection: String,
    /// Name of the index being changed.
    pub index_name: String,
    /// What was being attempted.
    pub operation: IndexOperation,
    /// The underlying cause.
    #[source]
    pub source: CollectionError,
}

impl IndexBuildError {
    /// Creates an index build error.
    pub fn new(
        collection: impl Into<String>,
        index_name: impl Into<String>,
        operation: IndexOperation,
        source: CollectionError,
    ) -> Self {
        Self {
            collection: collection.into(),
            index_name: index_name.into(),
            operation,
            source,
        }
    }
}

/// Errors reported by a collection handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// The index to drop does not exist.
    #[error("index not found: {name}")]
    IndexNotFound {
        /// Name of the index.
        name: String,
    },

    /// An identical index already exists.
    #[error("index already exists: {name}")]
    IndexAlreadyExists {
        /// Name of the index.
        name: String,
    },

    /// An existing index clashes with the requested one.
    #[error("index `{name}` conflicts with an existing index: {message}")]
    IndexConflict {
        /// Name of the requested index.
        name: String,
        /// Description of the clash.
        message: String,
    },

    /// A unique index would be violated.
    #[error("duplicate key for unique index `{index}`: {key}")]
    DuplicateKey {
        /// Name of the unique index.
        index: String,
        /// Rendering of the duplicated key.
        key: String,
    },

    /// The index definition or operation is not acceptable.
    #[error("invalid index `{name}`: {message}")]
    InvalidIndex {
        /// Name of the index.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// Stored bytes could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// Any other failure of the backing store.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl CollectionError {
    /// Creates an index not found error.
    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound { name: name.into() }
    }

    /// Creates an index already exists error.
    pub fn index_already_exists(name: impl Into<String>) -> Self {
        Self::IndexAlreadyExists { name: name.into() }
    }

    /// Creates an index conflict error.
    pub fn index_conflict(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexConflict {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid index error.
    pub fn invalid_index(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIndex {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
