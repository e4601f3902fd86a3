//! Plan execution against a collection handle.
//!
//! Drops run before creates and every call is issued sequentially, so a
//! rebuilt index never coexists with its predecessor. Several processes
//! may reconcile the same collection at once; "not found" on drop and
//! "already exists" on create mean another process got there first and
//! count as success.

use crate::collection::IndexManager;
use crate::config::ReconcileConfig;
use crate::error::{CollectionError, CoreError, CoreResult, IndexBuildError, IndexOperation};
use crate::index::descriptor::IndexSet;
use crate::index::diff::{self, ReconciliationPlan};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What a reconciliation pass did to one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Name of the collection.
    pub collection: String,
    /// The plan that was computed.
    pub plan: ReconciliationPlan,
    /// Indexes this pass dropped.
    pub dropped: Vec<String>,
    /// Indexes this pass created.
    pub created: Vec<String>,
    /// Operations that found the work already done.
    pub tolerated: Vec<String>,
    /// Whether the plan was only computed.
    pub dry_run: bool,
}

impl ReconcileReport {
    /// Returns true if the pass changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.dropped.is_empty() && self.created.is_empty()
    }
}

/// Brings a collection's indexes in line with `desired`.
///
/// Reads the collection's index metadata once, computes the plan and
/// executes it. With `config.verify` the metadata is read again and any
/// remaining difference fails with [`CoreError::Unreconciled`].
pub fn reconcile(
    collection: &dyn IndexManager,
    desired: &IndexSet,
    config: &ReconcileConfig,
) -> CoreResult<ReconcileReport> {
    let name = collection.collection_name().to_string();
    let observed = observe(collection)?;
    let plan = diff::plan(desired, &observed, config);

    debug!(
        collection = %name,
        create = ?plan.create_names(),
        drop = ?plan.to_drop,
        unchanged = plan.unchanged.len(),
        "computed index plan"
    );
    for retained in &plan.retained {
        warn!(collection = %name, index = %retained, "keeping unmanaged index");
    }

    if config.dry_run {
        return Ok(ReconcileReport {
            collection: name,
            plan,
            dry_run: true,
            ..ReconcileReport::default()
        });
    }

    let mut report = execute(collection, &plan)?;
    report.plan = plan;

    if config.verify {
        verify(collection, desired, &report.plan)?;
    }

    if !report.is_noop() {
        info!(
            "Reconciled indexes on {}: created {:?}, dropped {:?}",
            report.collection, report.created, report.dropped
        );
    }
    Ok(report)
}

/// Applies a plan: every drop, then every create.
///
/// Returns the first fatal error; operations already issued stay applied.
pub fn execute(
    collection: &dyn IndexManager,
    plan: &ReconciliationPlan,
) -> Result<ReconcileReport, IndexBuildError> {
    let name = collection.collection_name();
    let mut report = ReconcileReport {
        collection: name.to_string(),
        ..ReconcileReport::default()
    };

    for index in &plan.to_drop {
        match collection.drop_index(index) {
            Ok(()) => report.dropped.push(index.clone()),
            Err(CollectionError::IndexNotFound { .. }) => {
                debug!(collection = %name, index = %index, "index already dropped");
                report.tolerated.push(index.clone());
            }
            Err(source) => {
                return Err(IndexBuildError::new(name, index, IndexOperation::Drop, source));
            }
        }
    }

    for descriptor in &plan.to_create {
        match collection.create_index(descriptor) {
            Ok(()) => report.created.push(descriptor.name.clone()),
            Err(CollectionError::IndexAlreadyExists { .. }) => {
                debug!(collection = %name, index = %descriptor.name, "index already exists");
                report.tolerated.push(descriptor.name.clone());
            }
            Err(source) => {
                return Err(IndexBuildError::new(
                    name,
                    &descriptor.name,
                    IndexOperation::Create,
                    source,
                ));
            }
        }
    }

    Ok(report)
}

fn observe(collection: &dyn IndexManager) -> CoreResult<IndexSet> {
    collection
        .list_indexes()
        .map(IndexSet::from_descriptors)
        .map_err(|source| CoreError::collection(collection.collection_name(), source))
}

fn verify(
    collection: &dyn IndexManager,
    desired: &IndexSet,
    plan: &ReconciliationPlan,
) -> CoreResult<()> {
    let observed = observe(collection)?;
    let managed: IndexSet = observed
        .into_iter()
        .filter(|d| !plan.retained.contains(&d.name))
        .collect();

    if managed.equivalent(desired) {
        return Ok(());
    }
    Err(CoreError::Unreconciled {
        collection: collection.collection_name().to_string(),
        details: format!(
            "expected {:?}, found {:?}",
            desired.names(),
            managed.names()
        ),
    })
}
