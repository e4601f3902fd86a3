//! Index declarations and their reconciliation with live collections.
//!
//! Reconciliation runs in three steps:
//!
//! - [`resolve`]: a model declaration becomes a [`DesiredIndexSet`] keyed
//!   by stored field names
//! - [`plan`]: the desired set is compared with the collection's
//!   [`ObservedIndexSet`], producing a [`ReconciliationPlan`]
//! - [`execute`]: the plan is applied, drops first
//!
//! [`reconcile`] runs the last two against one collection handle.

mod descriptor;
mod diff;
mod executor;
mod options;
mod resolver;

pub use descriptor::{
    generated_name, DesiredIndexSet, IndexDescriptor, IndexKey, IndexSet, ObservedIndexSet,
    SortDirection, IDENTITY_FIELD, IDENTITY_INDEX_NAME,
};
pub use diff::{plan, ReconciliationPlan};
pub use executor::{execute, reconcile, ReconcileReport};
pub use options::{
    IndexOptions, OptionValue, EXPIRE_AFTER_SECONDS, PARTIAL_FILTER_EXPRESSION, SPARSE, UNIQUE,
};
pub use resolver::resolve;
