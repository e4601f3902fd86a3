//! Equality filters.

use crate::error::{CoreError, CoreResult};
use crate::model::{FieldMap, RawDocument};
use ciborium::Value;

/// A conjunction of equality conditions.
///
/// Filters built by application code name model fields; they are
/// translated to stored names before they reach a collection.
///
/// ```rust
/// use entimap_core::Filter;
///
/// let filter = Filter::eq("test_field", "query_test").and("count", 3);
/// assert_eq!(filter.conditions().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates a filter matching every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter with one condition.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(field, value)
    }

    /// Adds a condition.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Returns the conditions in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Returns true if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Rewrites field references to stored names.
    pub fn to_stored(&self, map: &FieldMap) -> CoreResult<Self> {
        let conditions = self
            .conditions
            .iter()
            .map(|(field, value)| {
                map.resolve(field)
                    .map(|stored| (stored, value.clone()))
                    .ok_or_else(|| CoreError::unknown_field(map.collection(), field))
            })
            .collect::<CoreResult<_>>()?;
        Ok(Self { conditions })
    }

    /// Returns true if a stored document satisfies every condition.
    #[must_use]
    pub fn matches(&self, document: &RawDocument) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| lookup(document, field) == Some(expected))
    }
}

/// Follows a dotted path through nested maps.
pub(crate) fn lookup<'a>(document: &'a RawDocument, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_text() == Some(segment))
                .map(|(_, v)| v)?,
            _ => return None,
        };
    }
    Some(current)
}
