//! Install command - install the catalog and register the resources

use cardpin_core::store::patch_store;
use cardpin_core::{
    Catalog, HttpTransport, Installer, PatchOutcome, ScopedToken, Settings, Transport,
};
use console::style;
use std::path::Path;

use crate::display;
use crate::error::{CliError, Result};

/// Run the install command
pub async fn run(settings: &Settings, catalog_path: Option<&Path>, skip_store: bool) -> Result<()> {
    let catalog = Catalog::load_or_builtin(catalog_path);

    let token = settings
        .github_token
        .as_ref()
        .map(|t| ScopedToken::new(settings.endpoints.api_base.clone(), t.clone()));
    let transport = HttpTransport::new(token)?;

    execute(&transport, settings, &catalog, skip_store).await
}

/// Install `catalog` through `transport`, then patch the resource store
pub async fn execute(
    transport: &dyn Transport,
    settings: &Settings,
    catalog: &Catalog,
    skip_store: bool,
) -> Result<()> {
    println!(
        "{} Installing {} dependencies into {}",
        style("→").blue().bold(),
        catalog.len(),
        style(settings.community_dir.display()).cyan()
    );

    let report = Installer::new(transport, settings).install_all(catalog).await;
    print!("{}", display::render_results(&report));

    let urls = report.installed_urls();

    if skip_store {
        println!("{} Skipping resource store patch", style("⚠").yellow());
    } else {
        match patch_store(&settings.store_path, settings.ui_mode(), &urls) {
            Ok(outcome) => {
                println!("{}", display::render_patch_outcome(&outcome, &settings.store_path));
                match outcome {
                    PatchOutcome::NotApplicable if !urls.is_empty() => {
                        println!("\nAdd to configuration.yaml:\n");
                        print!("{}", display::render_yaml_resources(&urls));
                    }
                    PatchOutcome::Patched { .. } => {
                        println!("{}", display::render_restart_reminder());
                    }
                    _ => {}
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %settings.store_path.display(),
                    error = %e,
                    "resource store patch skipped"
                );
                println!("{} {}", style("✗").red().bold(), e);
                print!("{}", display::render_manual_registration(&urls));
            }
        }
    }

    println!("\n{}", display::render_tally(&report));

    if !report.is_success() {
        println!("\n{}", display::render_manual_guidance(&report, settings));
        return Err(CliError::dependencies_failed(
            report.failure_count(),
            report.results.len(),
        ));
    }

    Ok(())
}
