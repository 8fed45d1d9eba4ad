//! Cardpin CLI - Install pinned Home Assistant frontend cards

use cardpin_core::{Endpoints, Settings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use error::Result;

#[derive(Parser)]
#[command(name = "cardpin")]
#[command(author = "Cardpin Contributors")]
#[command(version)]
#[command(
    about = "Install pinned Home Assistant frontend cards and register them as resources",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Home Assistant configuration directory
    #[arg(
        long,
        global = true,
        env = "CARDPIN_CONFIG_DIR",
        default_value = cardpin_core::config::DEFAULT_CONFIG_DIR
    )]
    config_dir: PathBuf,

    /// JSON catalog replacing the built-in one
    #[arg(long, global = true, env = "CARDPIN_CATALOG")]
    catalog: Option<PathBuf>,

    /// Treat the UI as configured in YAML mode
    #[arg(long, global = true)]
    yaml_mode: bool,

    /// Source-control REST API base URL
    #[arg(long, global = true, default_value = "https://api.github.com")]
    api_base: String,

    /// Source-control web base URL (source archives)
    #[arg(long, global = true, default_value = "https://github.com")]
    web_base: String,

    /// API token, sent to the API base only
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install every catalog entry and patch the resource store
    Install {
        /// Install files only, do not touch the resource store
        #[arg(long)]
        skip_store: bool,
    },

    /// Show the effective catalog
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let endpoints = Endpoints::new(&self.api_base, &self.web_base)?;
        Ok(Settings::for_config_dir(self.config_dir.clone())
            .with_endpoints(endpoints)
            .with_yaml_mode(self.yaml_mode)
            .with_github_token(self.github_token.clone()))
    }
}

/// Logs go to stderr; RUST_LOG overrides the default filter
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,cardpin=debug,cardpin_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Install { skip_store } => {
            let settings = cli.settings()?;
            commands::install::run(&settings, cli.catalog.as_deref(), *skip_store).await
        }
        Commands::Catalog { json } => commands::catalog::run(cli.catalog.as_deref(), *json),
    }
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        let code = e.exit_code();
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(code);
    }
}
