//! Roster-Harvest main entry point
//!
//! This is the command-line interface for the Roster-Harvest member pipeline.

use clap::Parser;
use roster_harvest::config::{
    load_config_with_hash, validate, Config, SourceKind, DEFAULT_CONFIG_HASH,
};
use roster_harvest::ingest::ShutdownToken;
use roster_harvest::pipeline::{harvest, RunSummary, EXIT_FATAL, EXIT_OK};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit code for a forced stop, as a shell reports SIGINT
const EXIT_INTERRUPTED: i32 = 130;

/// Roster-Harvest: a member roster ingestion pipeline
///
/// Roster-Harvest pulls the member list of one or more channels, keeps one
/// row per member and channel in a local SQLite store, and exports the store
/// as JSON and CSV.
#[derive(Parser, Debug)]
#[command(name = "roster-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A member roster ingestion pipeline", long_about = None)]
struct Cli {
    /// Channel to scrape (@name, name, or t.me link)
    #[arg(value_name = "TARGET", required_unless_present_any = ["stats", "export_only"])]
    target: Option<String>,

    /// Maximum members to fetch per channel
    #[arg(value_name = "MAX_MEMBERS")]
    max_members: Option<u32>,

    /// Base name for exported files
    #[arg(short, long, value_name = "BASE_NAME")]
    output: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the SQLite member store
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Number of persist workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Additional channel to scrape after TARGET (repeatable)
    #[arg(long, value_name = "TARGET")]
    also: Vec<String>,

    /// Replay members from a JSON fixture instead of generating them
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show statistics from the member store and exit
    #[arg(long, conflicts_with = "export_only")]
    stats: bool,

    /// Export the current store contents without scraping
    #[arg(long, conflicts_with = "stats")]
    export_only: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            EXIT_FATAL
        }
    };

    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, config_hash) = load_configuration(&cli)?;

    // Handle different modes
    if cli.stats {
        handle_stats(&config)?;
        Ok(EXIT_OK)
    } else if cli.export_only {
        handle_export_only(&config)?;
        Ok(EXIT_OK)
    } else {
        let mut targets: Vec<String> = cli.target.into_iter().collect();
        targets.extend(cli.also);
        handle_run(config, &config_hash, &targets).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("roster_harvest=info,warn"),
            1 => EnvFilter::new("roster_harvest=debug,info"),
            2 => EnvFilter::new("roster_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the optional config file and layers the CLI flags on top
fn load_configuration(cli: &Cli) -> Result<(Config, String), Box<dyn std::error::Error>> {
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => (Config::default(), DEFAULT_CONFIG_HASH.to_string()),
    };

    if let Some(max) = cli.max_members {
        config.ingest.max_members = max;
    }
    if let Some(base_name) = &cli.output {
        config.export.base_name = base_name.clone();
    }
    if let Some(database) = &cli.database {
        config.storage.database_path = database.clone();
    }
    if let Some(workers) = cli.workers {
        config.ingest.workers = workers;
    }
    if let Some(fixture) = &cli.fixture {
        config.source.kind = SourceKind::Fixture;
        config.source.fixture_path = Some(fixture.clone());
    }

    validate(&config)?;
    Ok((config, config_hash))
}

/// Handles the --stats mode: shows statistics from the member store
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use roster_harvest::output::{load_statistics, print_statistics};
    use roster_harvest::storage::open_store;
    use std::path::Path;

    println!("Database: {}\n", config.storage.database_path);

    // Open the database
    let store = open_store(Path::new(&config.storage.database_path))?;

    // Load statistics
    let stats = load_statistics(&store)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-only mode: re-exports the current store contents
fn handle_export_only(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use roster_harvest::pipeline::export_store;
    use roster_harvest::storage::open_store;
    use std::path::Path;

    println!("=== Exporting Member Store ===\n");
    println!("Database: {}", config.storage.database_path);
    println!("Directory: {}", config.export.directory.display());
    println!();

    let store = open_store(Path::new(&config.storage.database_path))?;

    tracing::info!("Loading members from database...");
    let (rows, paths) = export_store(&store, &config.export)?;

    println!("✓ Exported {} members", rows);
    for path in paths {
        println!("  - {}", path.display());
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_run(
    config: Config,
    config_hash: &str,
    targets: &[String],
) -> Result<i32, Box<dyn std::error::Error>> {
    tracing::info!(
        "Targets: {}, max members per target: {}, workers: {}",
        targets.join(", "),
        config.ingest.max_members,
        config.ingest.workers
    );

    let shutdown = ShutdownToken::new();
    tokio::spawn(watch_interrupts(shutdown.clone()));

    match harvest(config, config_hash, targets, shutdown).await {
        Ok(summary) => {
            print_run_summary(&summary);
            Ok(summary.exit_code())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// First Ctrl+C requests a graceful stop; a second one exits immediately
async fn watch_interrupts(shutdown: ShutdownToken) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if must_force_exit(&shutdown) {
            eprintln!("Second interrupt, exiting without waiting for workers");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

/// Handles one interrupt; returns true once a graceful stop was already asked for
fn must_force_exit(shutdown: &ShutdownToken) -> bool {
    if shutdown.is_triggered() {
        return true;
    }
    tracing::warn!("Interrupt received, finishing queued records (Ctrl+C again to force exit)");
    shutdown.trigger();
    false
}

fn print_run_summary(summary: &RunSummary) {
    use roster_harvest::output::print_ingestion_report;

    print_ingestion_report(&summary.report);
    println!();

    if summary.interrupted {
        println!("⚠ Run {} was interrupted", summary.run_id);
    }
    match summary.stored_rows {
        Some(rows) => println!("Stored members: {}", rows),
        None => println!("Stored members: unknown"),
    }

    match &summary.export_error {
        Some(e) => println!("✗ Export failed: {}", e),
        None => {
            println!("✓ Exported to:");
            for path in &summary.exported {
                println!("  - {}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_interrupt_forces_exit() {
        let shutdown = ShutdownToken::new();

        assert!(!must_force_exit(&shutdown));
        assert!(shutdown.is_triggered());
        assert!(must_force_exit(&shutdown));
    }

    #[test]
    fn test_cli_requires_target_unless_store_mode() {
        assert!(Cli::try_parse_from(["roster-harvest"]).is_err());
        assert!(Cli::try_parse_from(["roster-harvest", "--stats"]).is_ok());

        let cli = Cli::try_parse_from(["roster-harvest", "@chan", "25", "--also", "t.me/other"])
            .unwrap();
        assert_eq!(cli.target.as_deref(), Some("@chan"));
        assert_eq!(cli.max_members, Some(25));
        assert_eq!(cli.also, vec!["t.me/other".to_string()]);
    }
}
