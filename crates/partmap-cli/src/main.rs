//! Partmap CLI - map noisy part numbers and company names to catalog records.

use anyhow::Context;
use clap::Parser;
use partmap_cli::cli::{Cli, Command};
use partmap_cli::commands;
use partmap_cli::{Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(cli.verbose, &config.logging.level);

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Config(args) => {
            commands::execute_config(args, cli.config.as_deref(), &config, &formatter)?;
        }
        Command::Catalog(args) => {
            commands::execute_catalog(args, cli.catalog.as_deref(), &config, &formatter)?;
        }
        cmd => {
            let catalog = commands::catalog_path(cli.catalog.as_deref(), &config)?;
            let engine = commands::build_engine(&config, catalog)
                .with_context(|| format!("failed to load catalog {}", catalog.display()))?;

            match cmd {
                Command::Part(args) => commands::execute_part(args, &engine, &config.policy, &formatter).await?,
                Command::Entity(args) => commands::execute_entity(args, &engine, &config.policy, &formatter).await?,
                Command::Order(args) => commands::execute_order(args, engine, &config, &formatter).await?,
                Command::Correct(args) => commands::execute_correct(args, &engine, &formatter).await?,
                Command::Config(_) | Command::Catalog(_) => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}

/// Log to stderr; RUST_LOG wins over `--verbose`, which wins over the config level
fn init_logging(verbose: bool, level: &str) {
    let default = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
