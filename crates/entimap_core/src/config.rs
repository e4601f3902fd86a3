//! Reconciliation configuration.

/// Configuration for reconciling declared indexes with a collection.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Whether to drop indexes that no registered model declares.
    ///
    /// When disabled, unmanaged indexes are kept unless their key pattern
    /// collides with a declared index.
    pub prune_unmanaged: bool,

    /// Compute plans without creating or dropping anything.
    pub dry_run: bool,

    /// Re-read index metadata after applying a plan and fail if the
    /// collection still differs from the declared set.
    pub verify: bool,

    /// Reconcile independent collections on separate threads.
    pub parallel: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            prune_unmanaged: true,
            dry_run: false,
            verify: false,
            parallel: false,
        }
    }
}

impl ReconcileConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether unmanaged indexes are dropped.
    #[must_use]
    pub const fn prune_unmanaged(mut self, value: bool) -> Self {
        self.prune_unmanaged = value;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    /// Sets whether applied plans are verified.
    #[must_use]
    pub const fn verify(mut self, value: bool) -> Self {
        self.verify = value;
        self
    }

    /// Sets whether collections reconcile in parallel.
    #[must_use]
    pub const fn parallel(mut self, value: bool) -> Self {
        self.parallel = value;
        self
    }
}
