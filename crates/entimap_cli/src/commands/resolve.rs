//! Resolve command implementation.

use super::catalog::load_registry;
use entimap_core::IndexDescriptor;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Resolves every model and prints its desired indexes.
pub fn run(models: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Resolving models from {:?}", models);

    let resolved = resolve_file(models)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        _ => print_text_output(&resolved),
    }

    Ok(())
}

/// Resolves a models file into each collection's desired indexes.
pub fn resolve_file(
    models: &Path,
) -> Result<BTreeMap<String, Vec<IndexDescriptor>>, Box<dyn std::error::Error>> {
    let registry = load_registry(models)?;
    let resolved = registry
        .resolve_all()?
        .into_iter()
        .map(|(collection, set)| (collection, set.into_iter().collect()))
        .collect();
    Ok(resolved)
}

fn print_text_output(resolved: &BTreeMap<String, Vec<IndexDescriptor>>) {
    println!("Desired Indexes");
    println!("===============");

    for (collection, indexes) in resolved {
        println!("\n{}:", collection);
        if indexes.is_empty() {
            println!("  (none)");
        }
        for index in indexes {
            println!("  {}", index);
        }
    }
}
