use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;

use rail_terms::checker::{self, CheckOutcome};
use rail_terms::config::Config;
use rail_terms::logging;
use rail_terms::terms;

#[derive(Parser)]
#[command(name = "rail_terms")]
#[command(about = "Check and browse the British rail terms CSV")]
#[command(version)]
struct Cli {
    /// Config file (defaults to rail_terms.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the header row and print row and category counts
    Check {
        /// CSV file to check
        path: Option<PathBuf>,
    },
    /// Search terms, full forms, descriptions and categories
    Search {
        query: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List terms in a category ("all" lists everything)
    Category {
        name: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show one term in full, looked up by id or acronym
    Show {
        key: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show a random term
    Lucky {
        /// Only pick from this category
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let _guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    // no subcommand checks the configured file
    match cli.command.unwrap_or(Commands::Check { path: None }) {
        Commands::Check { path } => {
            let path = path.unwrap_or(config.csv_path);
            if let CheckOutcome::Checked(report) = checker::run_check(&path, &mut out) {
                info!(valid = report.is_valid(), "structure checked");
            }
        }
        Commands::Search { query, file } => {
            let path = file.unwrap_or(config.csv_path);
            terms::list_terms(&path, &mut out, |all| terms::search(all, &query))?;
        }
        Commands::Category { name, file } => {
            let path = file.unwrap_or(config.csv_path);
            terms::list_terms(&path, &mut out, |all| terms::filter_by_category(all, &name))?;
        }
        Commands::Show { key, file } => {
            let path = file.unwrap_or(config.csv_path);
            terms::show_term(&path, &key, &mut out)?;
        }
        Commands::Lucky { category, file } => {
            let path = file.unwrap_or(config.csv_path);
            let mut rng = rand::thread_rng();
            terms::lucky_term(&path, category.as_deref(), &mut rng, &mut out)?;
        }
    }

    Ok(())
}
