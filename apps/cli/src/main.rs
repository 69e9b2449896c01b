//! fli - VPC Flow Logs Insights query compiler
//!
//! Compiles a verb, fields and a filter expression into a CloudWatch Logs
//! Insights query and prints it. Nothing is executed.
//!
//! Usage:
//!   fli query count --filter "dstport = 22 and action = REJECT" --by srcaddr
//!   fli query sum bytes --by dstaddr --version 5 --explain
//!   fli compile -f queries.yaml

mod collection;
mod config;
mod logging;
mod options;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fli_querybuilder::{Schema, VpcFlowLogsSchema};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collection::QueryCollection;
use crate::config::FliConfig;
use crate::options::QueryArgs;

#[derive(Parser, Debug)]
#[command(name = "fli")]
#[command(version, about = "Compile VPC Flow Logs Insights queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Log level for fli crates (overrides configuration)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile one query and print it
    Query(QueryArgs),

    /// Compile every query in a YAML collection
    Compile {
        /// Collection file, or - for stdin
        #[arg(long, short = 'f')]
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = FliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate().context("Invalid configuration")?;

    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    let schema: Arc<dyn Schema> = Arc::new(VpcFlowLogsSchema::new());
    match cli.command {
        Commands::Query(args) => run_query(schema, &config, &args),
        Commands::Compile { file } => run_compile(schema, &config, &file),
    }
}

fn run_query(schema: Arc<dyn Schema>, config: &FliConfig, args: &QueryArgs) -> anyhow::Result<()> {
    let request = args.to_config();

    if args.explain {
        let explanation = options::explain(schema, &request, &config.query)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&explanation).context("Failed to serialize explanation")?
        );
        return Ok(());
    }

    let query = options::compile(schema, &request, &config.query)?;
    if args.collection {
        println!("# FLI Query Collection");
        print!("{}", args.to_collection().to_yaml()?);
    } else {
        println!("{}", query);
    }
    Ok(())
}

fn run_compile(schema: Arc<dyn Schema>, config: &FliConfig, file: &Path) -> anyhow::Result<()> {
    let collection = QueryCollection::load(file)?;
    tracing::info!(queries = collection.queries.len(), file = %file.display(), "Compiling collection");

    for (index, entry) in collection.queries.iter().enumerate() {
        let label = entry.label(index);
        let query = options::compile(Arc::clone(&schema), &entry.config, &config.query)
            .with_context(|| format!("invalid query '{}'", label))?;
        println!("# {}", label);
        println!("{}", query);
    }
    Ok(())
}
