//! ecargraph CLI: the main entry point.
//!
//! Commands:
//! - `write`: Convert an eCAR file to RDF triples
//! - `load`: Bulk-load an already converted file
//! - `ingest`: Convert, then load
//! - `setup`: Install the eCAR schema
//! - `drop`: Drop all data in the graph store
//! - `watch`: Convert and load new files in a directory
//! - `config`: Show or validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ecargraph",
    about = "ecargraph: eCAR audit logs to RDF triples for Dgraph",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.ecargraph/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dgraph Alpha gRPC address for the bulk loader
    #[arg(long, global = true)]
    alpha: Option<String>,

    /// Dgraph Zero address for the bulk loader
    #[arg(long, global = true)]
    zero: Option<String>,

    /// Dgraph Alpha HTTP endpoint for schema changes
    #[arg(long, global = true)]
    alpha_http: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a .json or .json.gz file as RDF triples (<file>.txt)
    Write {
        /// Source file
        file: PathBuf,

        /// Only keep records where predicate equals value: "predicate:search:value"
        #[arg(long)]
        only: Option<String>,

        /// Write triples here instead of <file>.txt
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load an already converted triple file with the bulk loader
    Load {
        /// Triple file
        file: PathBuf,
    },

    /// Convert a file and load the result
    Ingest {
        /// Source file
        file: PathBuf,

        /// Only keep records where predicate equals value: "predicate:search:value"
        #[arg(long)]
        only: Option<String>,
    },

    /// Add the eCAR schema to the graph store
    Setup,

    /// Drop all data in the graph store
    Drop {
        /// Required to actually drop
        #[arg(long)]
        confirm: bool,
    },

    /// Watch a directory and ingest new files as they appear
    Watch {
        /// Directory to watch (defaults to config, then the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Only keep records where predicate equals value: "predicate:search:value"
        #[arg(long)]
        only: Option<String>,

        /// Add the eCAR schema before watching
        #[arg(long)]
        setup: bool,

        /// Drop all data before watching
        #[arg(long)]
        drop: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the default config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let overrides = commands::Overrides {
        config: cli.config,
        alpha: cli.alpha,
        zero: cli.zero,
        alpha_http: cli.alpha_http,
    };

    match cli.command {
        Commands::Write {
            file,
            only,
            output,
            json,
        } => {
            let ctx = commands::start(&overrides)?;
            commands::write::run(&ctx, &file, only.as_deref(), output, json).await?
        }
        Commands::Load { file } => {
            let ctx = commands::start(&overrides)?;
            commands::load::run(&ctx, &file).await?
        }
        Commands::Ingest { file, only } => {
            let ctx = commands::start(&overrides)?;
            commands::ingest::run(&ctx, &file, only.as_deref()).await?
        }
        Commands::Setup => {
            let ctx = commands::start(&overrides)?;
            commands::schema::setup(&ctx).await?
        }
        Commands::Drop { confirm } => {
            let ctx = commands::start(&overrides)?;
            commands::schema::drop(&ctx, confirm).await?
        }
        Commands::Watch {
            dir,
            only,
            setup,
            drop,
        } => {
            let ctx = commands::start(&overrides)?;
            commands::watch::run(&ctx, dir, only.as_deref(), setup, drop).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&overrides)?,
            ConfigAction::Path => commands::config_cmd::path(&overrides)?,
            ConfigAction::Validate => commands::config_cmd::validate(&overrides)?,
        },
    }

    Ok(())
}
