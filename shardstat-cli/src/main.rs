//! CLI for the shardstat index analyzer.
//!
//! Reads run settings from flags, environment variables, and an optional
//! JSON config file, then analyzes a local index directory and prints the
//! summary to stdout. Logs go to stderr; set `RUST_LOG=debug` to list every
//! matched series and chunk ref.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use shardstat::storage::LocalIndexStore;
use shardstat::window::parse_timestamp;
use shardstat::{AnalysisConfig, IndexStore};
use tracing_subscriber::EnvFilter;

/// shardstat: series and chunk skew statistics for index shards.
#[derive(Parser)]
#[command(name = "shardstat", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Analyze series and chunk distribution for a table.
    #[command(after_help = "RUST_LOG=debug lists every matched series and chunk ref.")]
    Analyze {
        #[command(flatten)]
        location: TableLocation,

        /// JSON config file; flags and environment override its fields.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Comma-separated tenants. Discovered from storage when omitted.
        #[arg(long, env = "TENANTS", value_delimiter = ',')]
        tenants: Vec<String>,

        /// Window start, "YYYY-MM-DD HH:MM:SS" (UTC).
        #[arg(long, env = "START")]
        start: Option<String>,

        /// Window end, "YYYY-MM-DD HH:MM:SS" (UTC).
        #[arg(long, env = "END")]
        end: Option<String>,

        /// Comma-separated key=value label filters.
        #[arg(long, env = "LABEL_FILTER", value_delimiter = ',')]
        label_filter: Vec<String>,

        /// Chunk count a series must exceed to count as hot.
        #[arg(long, env = "HOT_SERIES_THRESHOLD")]
        hot_series_threshold: Option<usize>,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the tenants found in a table.
    Tenants {
        #[command(flatten)]
        location: TableLocation,
    },
}

/// Where the index lives and which table to read.
#[derive(Args)]
struct TableLocation {
    /// Local index directory.
    #[arg(long, env = "INDEX_DIR")]
    index_dir: PathBuf,

    /// Table name. Takes precedence over --bucket.
    #[arg(long, env = "TABLE")]
    table: Option<String>,

    /// Table number, appended to --table-prefix.
    #[arg(long, env = "BUCKET")]
    bucket: Option<u64>,

    /// Prefix of numbered table names.
    #[arg(long, env = "TABLE_PREFIX", default_value = "index_")]
    table_prefix: String,
}

impl TableLocation {
    /// Resolves the table name from --table or --bucket.
    fn table_name(&self) -> Option<String> {
        self.table
            .clone()
            .or_else(|| self.bucket.map(|b| format!("{}{b}", self.table_prefix)))
    }
}

/// Output format for the summary.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable lines.
    Text,
    /// JSON object.
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            location,
            config,
            tenants,
            start,
            end,
            label_filter,
            hot_series_threshold,
            format,
        } => build_config(
            &location,
            config.as_deref(),
            tenants,
            start.as_deref(),
            end.as_deref(),
            label_filter,
            hot_series_threshold,
        )
        .and_then(|config| cmd_analyze(&location.index_dir, &config, &format)),
        Commands::Tenants { location } => cmd_tenants(&location),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Merges the config file (if any) with flags and environment.
fn build_config(
    location: &TableLocation,
    config_path: Option<&Path>,
    tenants: Vec<String>,
    start: Option<&str>,
    end: Option<&str>,
    label_filter: Vec<String>,
    hot_series_threshold: Option<usize>,
) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let table = location.table_name();
    let mut config = match (config_path, table) {
        (Some(path), table) => {
            let mut config = AnalysisConfig::load(path)?;
            if let Some(table) = table {
                config.table = table;
            }
            config
        }
        (None, Some(table)) => AnalysisConfig::new(table),
        (None, None) => return Err("a table is required: pass --table, --bucket or --config".into()),
    };

    let tenants: Vec<String> = non_empty(tenants);
    if !tenants.is_empty() {
        config.tenants = tenants;
    }

    if !is_unset(&label_filter) {
        config.label_filters = label_filter;
    }

    if let Some(start) = start.filter(|s| !s.trim().is_empty()) {
        config.window.from = parse_timestamp(start)?;
    }
    if let Some(end) = end.filter(|s| !s.trim().is_empty()) {
        config.window.to = parse_timestamp(end)?;
    }

    if let Some(threshold) = hot_series_threshold {
        config.hot_series_threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

/// True when no label filter was given, or `LABEL_FILTER` is wholly empty.
/// Any other value, blank entries included, goes to the filter parser.
fn is_unset(values: &[String]) -> bool {
    match values {
        [] => true,
        [only] => only.is_empty(),
        _ => false,
    }
}

/// Drops blank entries left by empty environment values or trailing commas.
fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Implements `shardstat analyze`.
fn cmd_analyze(
    index_dir: &Path,
    config: &AnalysisConfig,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = LocalIndexStore::new(index_dir);
    let summary = shardstat::analyze(&store, config)?;

    match format {
        OutputFormat::Text => println!("{summary}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

/// Implements `shardstat tenants`.
fn cmd_tenants(location: &TableLocation) -> Result<(), Box<dyn std::error::Error>> {
    let table = location
        .table_name()
        .ok_or("a table is required: pass --table or --bucket")?;
    let store = LocalIndexStore::new(&location.index_dir);

    for tenant in store.list_tenants(&table)? {
        println!("{tenant}");
    }

    Ok(())
}
