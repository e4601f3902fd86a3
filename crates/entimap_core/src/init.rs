//! Start-up initialization: resolve every registered model, then
//! reconcile each collection's indexes.
//!
//! ## Usage
//!
//! ```rust
//! use entimap_core::{
//!     FieldSpec, IndexManager, Initializer, MemoryDatabase, ModelRegistry, ModelSpec,
//!     ReconcileConfig,
//! };
//! use std::sync::Arc;
//!
//! let db = MemoryDatabase::new();
//! let mut registry = ModelRegistry::new();
//! registry
//!     .register(ModelSpec::new("users").field(FieldSpec::new("email").alias("mail").indexed()))
//!     .unwrap();
//!
//! let report = Initializer::new(&registry, ReconcileConfig::default())
//!     .run(|name| -> Arc<dyn IndexManager> { db.collection(name) })
//!     .unwrap();
//! assert_eq!(report.collections[0].created, vec!["mail_1"]);
//! ```

use crate::collection::IndexManager;
use crate::config::ReconcileConfig;
use crate::error::{ConfigurationError, CoreResult};
use crate::index::{reconcile, resolve, IndexSet, ReconcileReport};
use crate::model::{DocumentModel, ModelSpec};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use tracing::info;

/// The models an application declares, keyed by collection name.
///
/// Registration order is kept; sequential initialization follows it.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model declaration.
    pub fn register(&mut self, spec: ModelSpec) -> Result<&mut Self, ConfigurationError> {
        if self.get(&spec.collection).is_some() {
            return Err(ConfigurationError::DuplicateCollection {
                collection: spec.collection,
            });
        }
        self.models.push(spec);
        Ok(self)
    }

    /// Builds a registry from declarations.
    pub fn from_specs(
        specs: impl IntoIterator<Item = ModelSpec>,
    ) -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Registers the declaration of a document type.
    pub fn register_model<T: DocumentModel>(&mut self) -> Result<&mut Self, ConfigurationError> {
        self.register(T::model_spec())
    }

    /// Returns the declaration for a collection.
    #[must_use]
    pub fn get(&self, collection: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.collection == collection)
    }

    /// Iterates over declarations in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ModelSpec> {
        self.models.iter()
    }

    /// Returns the number of registered models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolves every declaration into its desired index set.
    ///
    /// Fails on the first invalid declaration.
    pub fn resolve_all(&self) -> Result<BTreeMap<String, IndexSet>, ConfigurationError> {
        self.models
            .iter()
            .map(|spec| Ok((spec.collection.clone(), resolve(spec)?)))
            .collect()
    }
}

/// Outcome of initializing every registered collection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    /// One report per collection, in registration order.
    pub collections: Vec<ReconcileReport>,
}

impl InitReport {
    /// Returns the report for a collection.
    #[must_use]
    pub fn get(&self, collection: &str) -> Option<&ReconcileReport> {
        self.collections.iter().find(|r| r.collection == collection)
    }

    /// Total indexes created.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.collections.iter().map(|r| r.created.len()).sum()
    }

    /// Total indexes dropped.
    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.collections.iter().map(|r| r.dropped.len()).sum()
    }
}

/// Runs start-up reconciliation for a registry.
pub struct Initializer<'a> {
    registry: &'a ModelRegistry,
    config: ReconcileConfig,
}

impl<'a> Initializer<'a> {
    /// Creates an initializer.
    #[must_use]
    pub fn new(registry: &'a ModelRegistry, config: ReconcileConfig) -> Self {
        Self { registry, config }
    }

    /// Resolves every model, then reconciles each collection through the
    /// handle `open` returns for its name.
    ///
    /// No handle is opened until all declarations have resolved. The
    /// first failure aborts initialization; collections already
    /// reconciled keep their new indexes.
    pub fn run<F>(&self, open: F) -> CoreResult<InitReport>
    where
        F: Fn(&str) -> Arc<dyn IndexManager> + Sync,
    {
        let desired = self.registry.resolve_all()?;
        let targets: Vec<(&str, &IndexSet)> = self
            .registry
            .iter()
            .filter_map(|spec| {
                desired
                    .get(&spec.collection)
                    .map(|set| (spec.collection.as_str(), set))
            })
            .collect();

        let collections = if self.config.parallel {
            self.run_parallel(&targets, &open)?
        } else {
            targets
                .iter()
                .map(|(name, set)| reconcile(open(name).as_ref(), set, &self.config))
                .collect::<CoreResult<Vec<_>>>()?
        };

        let report = InitReport { collections };
        info!(
            "Initialized {} collection(s): {} index(es) created, {} dropped",
            report.collections.len(),
            report.created_count(),
            report.dropped_count()
        );
        Ok(report)
    }

    fn run_parallel<F>(
        &self,
        targets: &[(&str, &IndexSet)],
        open: &F,
    ) -> CoreResult<Vec<ReconcileReport>>
    where
        F: Fn(&str) -> Arc<dyn IndexManager> + Sync,
    {
        let config = &self.config;
        let results: Vec<CoreResult<ReconcileReport>> = thread::scope(|scope| {
            let handles: Vec<_> = targets
                .iter()
                .map(|(name, set)| {
                    scope.spawn(move || reconcile(open(name).as_ref(), set, config))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });
        results.into_iter().collect()
    }
}
