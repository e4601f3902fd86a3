//! Concurrent start-up stress helpers.
//!
//! Several application instances may initialize against the same
//! database at once. These helpers run that race and report how it went.

use entimap_core::{CoreError, MemoryDatabase, ModelRegistry, ReconcileConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Initializations that succeeded.
    pub successful: usize,
    /// Initializations that failed.
    pub failed: usize,
    /// Indexes created across all instances.
    pub created: usize,
    /// Operations that found the work already done, across all instances.
    pub tolerated: usize,
    /// Total duration.
    pub duration: Duration,
    /// Errors reported by failed instances.
    pub errors: Vec<String>,
}

impl StressTestResult {
    /// Returns true if every instance initialized cleanly.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Successful: {}", self.successful);
        println!("Failed: {}", self.failed);
        println!("Indexes created: {}", self.created);
        println!("Tolerated: {}", self.tolerated);
        println!("Duration: {:?}", self.duration);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent instances.
    pub instances: usize,
    /// Rounds each instance initializes.
    pub rounds: usize,
    /// Reconciliation settings each instance uses.
    pub reconcile: ReconcileConfig,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            instances: 8,
            rounds: 5,
            reconcile: ReconcileConfig::default(),
        }
    }
}

/// Initializes `registry` from `config.instances` threads at once, each
/// repeating `config.rounds` times against the shared database.
pub fn concurrent_init(
    db: &Arc<MemoryDatabase>,
    registry: &Arc<ModelRegistry>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let created = Arc::new(AtomicUsize::new(0));
    let tolerated = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.instances));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.instances)
        .map(|_| {
            let db = Arc::clone(db);
            let registry = Arc::clone(registry);
            let successful = Arc::clone(&successful);
            let created = Arc::clone(&created);
            let tolerated = Arc::clone(&tolerated);
            let barrier = Arc::clone(&barrier);
            let reconcile = config.reconcile.clone();
            let rounds = config.rounds;

            thread::spawn(move || -> Vec<CoreError> {
                barrier.wait();
                let mut errors = Vec::new();
                for _ in 0..rounds {
                    match db.init(&registry, &reconcile) {
                        Ok(report) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                            created.fetch_add(report.created_count(), Ordering::Relaxed);
                            let skipped: usize = report
                                .collections
                                .iter()
                                .map(|c| c.tolerated.len())
                                .sum();
                            tolerated.fetch_add(skipped, Ordering::Relaxed);
                        }
                        Err(e) => errors.push(e),
                    }
                }
                errors
            })
        })
        .collect();

    let errors: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("Stress thread panicked"))
        .map(|e| e.to_string())
        .collect();

    StressTestResult {
        successful: successful.load(Ordering::Relaxed),
        failed: errors.len(),
        created: created.load(Ordering::Relaxed),
        tolerated: tolerated.load(Ordering::Relaxed),
        duration: start.elapsed(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{aliased_index_model, index_names, registry};
    use entimap_core::{FieldSpec, IndexAnnotation, ModelSpec, SortDirection};

    fn models() -> Arc<ModelRegistry> {
        Arc::new(registry(vec![
            aliased_index_model("alpha", "aliasedField"),
            ModelSpec::new("beta")
                .field(FieldSpec::new("email").alias("mail").index(IndexAnnotation::default().unique()))
                .field(
                    FieldSpec::new("age")
                        .alias("yearsOld")
                        .index(IndexAnnotation::new(SortDirection::Descending)),
                ),
        ]))
    }

    #[test]
    fn concurrent_instances_converge() {
        let db = Arc::new(MemoryDatabase::new());
        let result = concurrent_init(&db, &models(), &StressConfig::default());

        assert!(result.all_succeeded(), "errors: {:?}", result.errors);
        assert_eq!(index_names(&*db.collection("alpha")), vec!["aliasedField_1"]);
        assert_eq!(
            index_names(&*db.collection("beta")),
            vec!["mail_1", "yearsOld_-1"]
        );
        // Each index is built exactly once; every other attempt either saw
        // it in place or was tolerated.
        assert_eq!(result.created, 3);
    }

    #[test]
    fn concurrent_alias_change_converges() {
        let db = Arc::new(MemoryDatabase::new());
        db.init(
            &registry(vec![aliased_index_model("alpha", "before")]),
            &ReconcileConfig::default(),
        )
        .unwrap();

        let after = Arc::new(registry(vec![aliased_index_model("alpha", "after")]));
        let config = StressConfig {
            instances: 4,
            rounds: 3,
            reconcile: ReconcileConfig::default().parallel(true),
        };
        let result = concurrent_init(&db, &after, &config);

        assert!(result.all_succeeded(), "errors: {:?}", result.errors);
        assert_eq!(index_names(&*db.collection("alpha")), vec!["after_1"]);
    }
}
