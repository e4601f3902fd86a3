//! Comparison of desired and observed index sets.
//!
//! # Invariants
//!
//! - The identity index is never compared, dropped or created
//! - Indexes are matched by name; a name match with a different key
//!   pattern or different options is replaced (drop, then create)
//! - A plan computed against the result of executing the previous plan
//!   is empty

use crate::config::ReconcileConfig;
use crate::index::descriptor::{IndexDescriptor, IndexSet};
use serde::Serialize;

/// The changes needed to bring a collection's indexes in line with its
/// declared indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    /// Indexes to create, in declaration order.
    pub to_create: Vec<IndexDescriptor>,
    /// Names of indexes to drop, sorted.
    pub to_drop: Vec<String>,
    /// Names of declared indexes already in place, sorted.
    pub unchanged: Vec<String>,
    /// Names of unmanaged indexes left alone, sorted.
    pub retained: Vec<String>,
}

impl ReconciliationPlan {
    /// Returns true if the plan creates and drops nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_drop.is_empty()
    }

    /// Returns the names of indexes to create.
    #[must_use]
    pub fn create_names(&self) -> Vec<&str> {
        self.to_create.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Computes the plan that turns `observed` into `desired`.
///
/// Unmanaged observed indexes are dropped when `config.prune_unmanaged`
/// is set. Otherwise they are retained, unless their key pattern matches
/// a desired index under another name: such an index would block the
/// create, so it is dropped regardless.
#[must_use]
pub fn plan(desired: &IndexSet, observed: &IndexSet, config: &ReconcileConfig) -> ReconciliationPlan {
    let wanted = desired.by_name();
    let present = observed.by_name();
    let mut plan = ReconciliationPlan::default();

    for (name, existing) in &present {
        match wanted.get(name) {
            Some(declared) if declared.same_definition(existing) => {
                plan.unchanged.push((*name).to_string());
            }
            Some(_) => plan.to_drop.push((*name).to_string()),
            None => {
                let collides = desired.iter().any(|d| d.same_keys(existing));
                if config.prune_unmanaged || collides {
                    plan.to_drop.push((*name).to_string());
                } else {
                    plan.retained.push((*name).to_string());
                }
            }
        }
    }

    for declared in desired {
        let in_place = present
            .get(declared.name.as_str())
            .map_or(false, |existing| existing.same_definition(declared));
        if !in_place {
            plan.to_create.push(declared.clone());
        }
    }

    plan
}
