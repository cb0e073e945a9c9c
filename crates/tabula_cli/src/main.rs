//! Tabula CLI
//!
//! Command-line tools for Tabula record collections.
//!
//! # Commands
//!
//! - `list` - Search, filter and sort a collection
//! - `export` - Export a collection as CSV
//! - `import` - Import CSV rows into a collection
//! - `template` - Write an import template
//! - `delete` - Remove an entity and detach references to it
//! - `inspect` - Display collections, counts and summaries

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tabula command-line record tools.
#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the workspace directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Path to the schema file
    #[arg(global = true, short, long)]
    schema: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, filter and sort a collection
    List {
        /// Collection name
        collection: String,

        /// Free-text search term
        #[arg(long)]
        search: Option<String>,

        /// Sort field; repeat to toggle the direction
        #[arg(long = "sort")]
        sort: Vec<String>,

        /// Exact filter as field=value
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Range filter as field=min..max (either side may be empty)
        #[arg(long = "range")]
        ranges: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Export a collection as CSV
    Export {
        /// Collection name
        collection: String,

        /// Output file or directory (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Include the id column
        #[arg(long)]
        include_id: bool,
    },

    /// Import CSV rows into a collection
    Import {
        /// Collection name
        collection: String,

        /// CSV file to import
        file: PathBuf,
    },

    /// Write an import template
    Template {
        /// Collection name
        collection: String,

        /// Number of sample rows (1 to 3)
        #[arg(short, long)]
        rows: Option<usize>,

        /// Output file or directory (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Remove an entity and detach references to it
    Delete {
        /// Collection name
        collection: String,

        /// Entity id
        id: String,
    },

    /// Display collections, counts and summaries
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("Tabula CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Tabula Core v{}", tabula_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Workspace path required (--path)")?;
    let schema = cli.schema.ok_or("Schema file required (--schema)")?;
    let mut workspace = commands::open_workspace(&path, &schema)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::List {
            collection,
            search,
            sort,
            filters,
            ranges,
            format,
        } => {
            let query = commands::list::ListQuery {
                search,
                sort,
                filters,
                ranges,
            };
            commands::list::run(&mut workspace, &collection, &query, &format, &mut out)?;
        }
        Commands::Export {
            collection,
            out: target,
            include_id,
        } => {
            commands::export::run(&workspace, &collection, target.as_deref(), include_id, &mut out)?;
        }
        Commands::Import { collection, file } => {
            commands::import::run(&mut workspace, &collection, &file, &mut out)?;
        }
        Commands::Template {
            collection,
            rows,
            out: target,
        } => {
            commands::template::run(&workspace, &collection, rows, target.as_deref(), &mut out)?;
        }
        Commands::Delete { collection, id } => {
            commands::delete::run(&mut workspace, &collection, &id, &mut out)?;
        }
        Commands::Inspect { format } => {
            commands::inspect::run(&workspace, &format, &mut out)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
