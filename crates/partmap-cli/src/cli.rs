//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Partmap CLI - Map noisy part numbers and company names to catalog records.
#[derive(Debug, Parser)]
#[command(name = "partmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Catalog to resolve against (.json document or SQLite database)
    #[arg(long, global = true, env = "PARTMAP_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (keys only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a vendor part number
    Part(PartArgs),

    /// Resolve a company name, optionally with its billing address
    Entity(EntityArgs),

    /// Resolve a purchase-order document
    Order(OrderArgs),

    /// Record an operator's mapping
    Correct(CorrectArgs),

    /// Inspect or build catalogs
    Catalog(CatalogArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the part command.
#[derive(Debug, Parser)]
pub struct PartArgs {
    /// Part number as printed by the vendor
    pub identifier: String,

    /// Line description, used when the identifier matches nothing
    #[arg(short, long)]
    pub description: Option<String>,
}

/// Arguments for the entity command.
#[derive(Debug, Parser)]
pub struct EntityArgs {
    /// Company name
    pub name: String,

    /// Billing address block (use \n between lines)
    #[arg(short, long)]
    pub address: Option<String>,
}

/// Arguments for the order command.
#[derive(Debug, Parser)]
pub struct OrderArgs {
    /// JSON purchase-order document
    pub file: PathBuf,
}

/// Arguments for the correct command.
#[derive(Debug, Parser)]
pub struct CorrectArgs {
    /// Catalog key chosen by the operator
    pub key: String,
}

/// Arguments for catalog management.
#[derive(Debug, Parser)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub action: CatalogAction,
}

/// Catalog actions.
#[derive(Debug, Subcommand)]
pub enum CatalogAction {
    /// Record counts and content fingerprint
    Stats,

    /// Load a JSON catalog document into a SQLite database
    Import {
        /// JSON catalog document
        json: PathBuf,
        /// SQLite database to create or update
        db: PathBuf,
    },
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl EntityArgs {
    /// Address block with literal `\n` sequences turned into line breaks
    pub fn address_block(&self) -> Option<String> {
        self.address
            .as_deref()
            .map(|a| a.replace("\\n", "\n"))
            .filter(|a| !a.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_command() {
        let cli = Cli::parse_from(["partmap", "part", "103D7-2", "--description", "cutting tip"]);
        match cli.command {
            Command::Part(args) => {
                assert_eq!(args.identifier, "103D7-2");
                assert_eq!(args.description.as_deref(), Some("cutting tip"));
            }
            _ => panic!("Expected Part command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "partmap",
            "correct",
            "C1002",
            "--catalog",
            "catalog.json",
            "--format",
            "json",
            "-v",
        ]);
        assert_eq!(cli.catalog, Some(PathBuf::from("catalog.json")));
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Correct(_)));
    }

    #[test]
    fn test_catalog_import() {
        let cli = Cli::parse_from(["partmap", "catalog", "import", "parts.json", "parts.db"]);
        match cli.command {
            Command::Catalog(CatalogArgs {
                action: CatalogAction::Import { json, db },
            }) => {
                assert_eq!(json, PathBuf::from("parts.json"));
                assert_eq!(db, PathBuf::from("parts.db"));
            }
            _ => panic!("Expected catalog import"),
        }
    }

    #[test]
    fn test_address_block_escapes() {
        let args = EntityArgs {
            name: "Acme Gas".to_string(),
            address: Some("400 Industrial Pkwy\\nPeoria, IL 61602".to_string()),
        };
        assert_eq!(args.address_block().as_deref(), Some("400 Industrial Pkwy\nPeoria, IL 61602"));

        let blank = EntityArgs {
            name: "Acme Gas".to_string(),
            address: Some("  ".to_string()),
        };
        assert!(blank.address_block().is_none());
    }
}
