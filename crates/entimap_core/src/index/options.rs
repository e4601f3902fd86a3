//! Index options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Option name for unique indexes.
pub const UNIQUE: &str = "unique";
/// Option name for sparse indexes.
pub const SPARSE: &str = "sparse";
/// Option name for TTL indexes.
pub const EXPIRE_AFTER_SECONDS: &str = "expireAfterSeconds";
/// Option name for partial indexes.
pub const PARTIAL_FILTER_EXPRESSION: &str = "partialFilterExpression";

/// A value held by an index option.
///
/// Floats are not supported so option sets compare exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Text.
    Text(String),
    /// Array of values.
    Array(Vec<OptionValue>),
    /// Nested document, such as a partial filter expression.
    Document(BTreeMap<String, OptionValue>),
}

impl OptionValue {
    /// Returns the boolean if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Integer`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the document if this is a `Document`.
    #[must_use]
    pub fn as_document(&self) -> Option<&BTreeMap<String, OptionValue>> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BTreeMap<String, OptionValue>> for OptionValue {
    fn from(value: BTreeMap<String, OptionValue>) -> Self {
        Self::Document(value)
    }
}

/// Options attached to an index, keyed by option name.
///
/// A boolean option set to `false` means the same as leaving it out, so
/// such entries are never stored. Two option sets are equal exactly when
/// they would build the same index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, OptionValue>",
    into = "BTreeMap<String, OptionValue>"
)]
pub struct IndexOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl IndexOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, dropping it if the value is `false`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(self) -> Self {
        self.with(UNIQUE, true)
    }

    /// Marks the index sparse.
    #[must_use]
    pub fn sparse(self) -> Self {
        self.with(SPARSE, true)
    }

    /// Expires documents this many seconds after the indexed time.
    #[must_use]
    pub fn expire_after_seconds(self, seconds: i64) -> Self {
        self.with(EXPIRE_AFTER_SECONDS, seconds)
    }

    /// Restricts the index to documents matching `filter`.
    #[must_use]
    pub fn partial_filter(self, filter: BTreeMap<String, OptionValue>) -> Self {
        self.with(PARTIAL_FILTER_EXPRESSION, filter)
    }

    /// Sets an option in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        let name = name.into();
        match value.into() {
            OptionValue::Bool(false) => {
                self.entries.remove(&name);
            }
            value => {
                self.entries.insert(name, value);
            }
        }
    }

    /// Returns the value of an option.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.get(name)
    }

    /// Removes an option, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.entries.remove(name)
    }

    /// Returns true if the index is unique.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.flag(UNIQUE)
    }

    /// Returns true if the index is sparse.
    #[must_use]
    pub fn is_sparse(&self) -> bool {
        self.flag(SPARSE)
    }

    /// Returns the partial filter expression, if any.
    #[must_use]
    pub fn partial_filter_expression(&self) -> Option<&BTreeMap<String, OptionValue>> {
        self.get(PARTIAL_FILTER_EXPRESSION)
            .and_then(OptionValue::as_document)
    }

    /// Iterates over options in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of options set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no options are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(OptionValue::as_bool).unwrap_or(false)
    }
}

impl From<BTreeMap<String, OptionValue>> for IndexOptions {
    fn from(entries: BTreeMap<String, OptionValue>) -> Self {
        let mut options = Self::new();
        for (name, value) in entries {
            options.set(name, value);
        }
        options
    }
}

impl From<IndexOptions> for BTreeMap<String, OptionValue> {
    fn from(options: IndexOptions) -> Self {
        options.entries
    }
}
