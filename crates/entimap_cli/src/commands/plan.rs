//! Plan command implementation.

use super::catalog::{load_catalog, load_registry, open_database};
use entimap_core::{InitReport, ReconcileConfig};
use std::path::Path;
use tracing::info;

/// Computes and prints the reconciliation plan without changing anything.
pub fn run(
    models: &Path,
    catalog: &Path,
    keep_unmanaged: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Planning {:?} against catalog {:?}", models, catalog);

    let report = compute(models, catalog, keep_unmanaged)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_text_output(&report),
    }

    Ok(())
}

/// Runs a dry reconciliation of `models` against `catalog`.
pub fn compute(
    models: &Path,
    catalog: &Path,
    keep_unmanaged: bool,
) -> Result<InitReport, Box<dyn std::error::Error>> {
    let registry = load_registry(models)?;
    let db = open_database(&load_catalog(catalog)?);
    let config = ReconcileConfig::default()
        .prune_unmanaged(!keep_unmanaged)
        .dry_run(true);
    Ok(db.init(&registry, &config)?)
}

pub(crate) fn print_text_output(report: &InitReport) {
    println!("Index Plan");
    println!("==========");

    for collection in &report.collections {
        let plan = &collection.plan;
        println!("\n{}:", collection.collection);
        if plan.is_empty() {
            println!("  up to date");
        }
        for name in &plan.to_drop {
            println!("  - drop   {}", name);
        }
        for descriptor in &plan.to_create {
            println!("  + create {}", descriptor);
        }
        for name in &plan.unchanged {
            println!("  = keep   {}", name);
        }
        for name in &plan.retained {
            println!("  ? unmanaged {}", name);
        }
    }
}
