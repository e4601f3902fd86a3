//! Apply command implementation.

use super::catalog::{load_catalog, load_registry, open_database, save_catalog, snapshot};
use super::plan::print_text_output;
use entimap_core::{InitReport, ReconcileConfig};
use std::path::Path;
use tracing::info;

/// Reconciles the catalog with the declared models and writes it back.
pub fn run(
    models: &Path,
    catalog: &Path,
    keep_unmanaged: bool,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = apply(models, catalog, keep_unmanaged, dry_run)?;

    if dry_run {
        println!("DRY RUN - No changes will be made\n");
        print_text_output(&report);
        return Ok(());
    }

    println!("Applied index changes");
    println!("=====================");
    for collection in &report.collections {
        if collection.is_noop() {
            println!("  {}: up to date", collection.collection);
            continue;
        }
        println!(
            "  {}: created {:?}, dropped {:?}",
            collection.collection, collection.created, collection.dropped
        );
    }
    println!(
        "\nTotal: {} created, {} dropped",
        report.created_count(),
        report.dropped_count()
    );

    Ok(())
}

/// Reconciles and, unless `dry_run`, saves the resulting catalog.
pub fn apply(
    models: &Path,
    catalog: &Path,
    keep_unmanaged: bool,
    dry_run: bool,
) -> Result<InitReport, Box<dyn std::error::Error>> {
    info!("Applying {:?} to catalog {:?}", models, catalog);

    let registry = load_registry(models)?;
    let db = open_database(&load_catalog(catalog)?);
    let config = ReconcileConfig::default()
        .prune_unmanaged(!keep_unmanaged)
        .dry_run(dry_run)
        .verify(!dry_run);
    let report = db.init(&registry, &config)?;

    if !dry_run {
        save_catalog(catalog, &snapshot(&db)?)?;
        info!("Wrote catalog {:?}", catalog);
    }
    Ok(report)
}
