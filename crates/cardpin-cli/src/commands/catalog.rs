//! Catalog command - show the effective dependency catalog

use cardpin_core::Catalog;
use console::style;
use std::path::Path;

use crate::error::Result;

/// Run the catalog command
pub fn run(catalog_path: Option<&Path>, output_json: bool) -> Result<()> {
    let catalog = Catalog::load_or_builtin(catalog_path);

    if output_json {
        let json = serde_json::to_string_pretty(catalog.entries())?;
        println!("{}", json);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("Catalog is empty");
        return Ok(());
    }

    println!(
        "{:<30} {:<42} {:<18} {:<28} {}",
        style("NAME").bold(),
        style("REPOSITORY").bold(),
        style("STRATEGY").bold(),
        style("FOLDER").bold(),
        style("PATTERN").bold()
    );

    for entry in catalog.iter() {
        println!(
            "{:<30} {:<42} {:<18} {:<28} {}",
            entry.name,
            entry.repository,
            entry.strategy.to_string(),
            entry.install_folder,
            style(&entry.name_pattern).dim()
        );
    }

    println!("\n{} entries", catalog.len());
    Ok(())
}
