//! Index descriptors and index sets.

use crate::index::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the database's mandatory primary-key index.
pub const IDENTITY_INDEX_NAME: &str = "_id_";

/// Stored name of the identity field.
pub const IDENTITY_FIELD: &str = "_id";

/// Sort direction or special type of one index key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDirection", into = "RawDirection")]
pub enum SortDirection {
    /// Ascending order (`1`).
    #[default]
    Ascending,
    /// Descending order (`-1`).
    Descending,
    /// Full-text index.
    Text,
    /// Hashed index.
    Hashed,
    /// Spherical geometry index.
    Geo2dSphere,
}

impl SortDirection {
    /// Returns the token used in generated index names and key documents.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Ascending => "1",
            Self::Descending => "-1",
            Self::Text => "text",
            Self::Hashed => "hashed",
            Self::Geo2dSphere => "2dsphere",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Wire shape of a direction: `1`, `-1`, or a type name.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDirection {
    Order(i64),
    Kind(String),
}

impl TryFrom<RawDirection> for SortDirection {
    type Error = String;

    fn try_from(raw: RawDirection) -> Result<Self, Self::Error> {
        match raw {
            RawDirection::Order(1) => Ok(Self::Ascending),
            RawDirection::Order(-1) => Ok(Self::Descending),
            RawDirection::Order(other) => Err(format!("invalid index direction: {}", other)),
            RawDirection::Kind(kind) => match kind.as_str() {
                "text" => Ok(Self::Text),
                "hashed" => Ok(Self::Hashed),
                "2dsphere" => Ok(Self::Geo2dSphere),
                _ => Err(format!("unknown index type: {}", kind)),
            },
        }
    }
}

impl From<SortDirection> for RawDirection {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => RawDirection::Order(1),
            SortDirection::Descending => RawDirection::Order(-1),
            other => RawDirection::Kind(other.token().to_string()),
        }
    }
}

/// One component of an index key pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    /// Stored field name (or dotted path) the key reads.
    pub field: String,
    /// Direction or index type.
    #[serde(default)]
    pub direction: SortDirection,
}

impl IndexKey {
    /// Creates an index key.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Creates an ascending index key.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }
}

/// Generates the conventional name for a key pattern.
///
/// Each key contributes `<field>_<direction>`, joined by `_`, so
/// `[("name", 1), ("age", -1)]` becomes `name_1_age_-1`.
#[must_use]
pub fn generated_name(keys: &[IndexKey]) -> String {
    keys.iter()
        .map(|k| format!("{}_{}", k.field, k.direction.token()))
        .collect::<Vec<_>>()
        .join("_")
}

/// Canonical description of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Index name, unique within a collection.
    pub name: String,
    /// Ordered key pattern over stored field names.
    pub keys: Vec<IndexKey>,
    /// Index options.
    #[serde(default, skip_serializing_if = "IndexOptions::is_empty")]
    pub options: IndexOptions,
}

impl IndexDescriptor {
    /// Creates a descriptor with a generated name.
    #[must_use]
    pub fn new(keys: Vec<IndexKey>, options: IndexOptions) -> Self {
        Self {
            name: generated_name(&keys),
            keys,
            options,
        }
    }

    /// Creates a descriptor with an explicit name.
    pub fn named(name: impl Into<String>, keys: Vec<IndexKey>, options: IndexOptions) -> Self {
        Self {
            name: name.into(),
            keys,
            options,
        }
    }

    /// The identity index every collection carries.
    #[must_use]
    pub fn identity() -> Self {
        Self::named(
            IDENTITY_INDEX_NAME,
            vec![IndexKey::ascending(IDENTITY_FIELD)],
            IndexOptions::new(),
        )
    }

    /// Returns true if this is the identity index.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.name == IDENTITY_INDEX_NAME
    }

    /// Returns true if both descriptors would build the same index,
    /// ignoring names.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.keys == other.keys && self.options == other.options
    }

    /// Returns true if both descriptors share a key pattern.
    #[must_use]
    pub fn same_keys(&self, other: &Self) -> bool {
        self.keys == other.keys
    }

    /// Returns the stored field names in key order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.field.as_str())
    }
}

impl fmt::Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.name)?;
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {}: {}", key.field, key.direction)?;
        }
        f.write_str(" }")?;
        for (name, value) in self.options.iter() {
            write!(f, " {}={:?}", name, value)?;
        }
        Ok(())
    }
}

/// A set of index descriptors for one collection, keyed by name.
///
/// Descriptors keep their insertion order; the identity index is never
/// part of a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet {
    descriptors: Vec<IndexDescriptor>,
}

/// Indexes declared by the running code for one collection.
pub type DesiredIndexSet = IndexSet;

/// Indexes currently materialized in one collection.
pub type ObservedIndexSet = IndexSet;

impl IndexSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set, skipping the identity index. A later descriptor with
    /// an existing name replaces the earlier one.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = IndexDescriptor>) -> Self {
        let mut set = Self::new();
        for descriptor in descriptors {
            set.insert(descriptor);
        }
        set
    }

    /// Inserts a descriptor, returning the one it replaced.
    pub fn insert(&mut self, descriptor: IndexDescriptor) -> Option<IndexDescriptor> {
        if descriptor.is_identity() {
            return None;
        }
        match self.descriptors.iter_mut().find(|d| d.name == descriptor.name) {
            Some(existing) => Some(std::mem::replace(existing, descriptor)),
            None => {
                self.descriptors.push(descriptor);
                None
            }
        }
    }

    /// Looks up a descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Returns true if an index with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, IndexDescriptor> {
        self.descriptors.iter()
    }

    /// Returns the names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Returns a name-to-descriptor lookup.
    #[must_use]
    pub fn by_name(&self) -> BTreeMap<&str, &IndexDescriptor> {
        self.descriptors
            .iter()
            .map(|d| (d.name.as_str(), d))
            .collect()
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns true if both sets hold the same definitions under the same
    /// names, regardless of order.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|d| {
                other
                    .get(&d.name)
                    .map_or(false, |o| o.same_definition(d))
            })
    }
}

impl IntoIterator for IndexSet {
    type Item = IndexDescriptor;
    type IntoIter = std::vec::IntoIter<IndexDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.into_iter()
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a IndexDescriptor;
    type IntoIter = std::slice::Iter<'a, IndexDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl FromIterator<IndexDescriptor> for IndexSet {
    fn from_iter<I: IntoIterator<Item = IndexDescriptor>>(iter: I) -> Self {
        Self::from_descriptors(iter)
    }
}
