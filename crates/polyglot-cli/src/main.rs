// crates/polyglot-cli/src/main.rs
// ============================================================================
// Module: Polyglot CLI Entry Point
// Description: Command dispatcher for serving, seeding, and exporting catalogs.
// Purpose: Operate a translation catalog from configuration on the command line.
// Dependencies: clap, polyglot-api, polyglot-config, polyglot-core, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `polyglot` binary runs the HTTP server, bulk-loads synthetic entries
//! into a `SQLite` catalog, exports the catalog as JSON, and validates
//! configuration files. All output goes through explicit stdout and stderr
//! writers.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod seed;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use polyglot_api::ApiServer;
use polyglot_api::build_stores;
use polyglot_config::PolyglotConfig;
use polyglot_config::StoreType;
use polyglot_core::EntryView;
use polyglot_core::MAX_EXPORT_PAGE_SIZE;
use polyglot_core::SharedTranslationStore;
use polyglot_core::TranslationCatalog;
use thiserror::Error;

use crate::seed::SeedGenerator;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Upper bound on entries generated by one `seed` run.
const MAX_SEED_COUNT: usize = 10_000_000;
/// Upper bound on entries written per transaction.
const MAX_SEED_BATCH: usize = 50_000;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "polyglot", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the catalog HTTP server.
    Serve(ConfigArg),
    /// Bulk-load synthetic translation entries.
    Seed(SeedCommand),
    /// Write every entry as a JSON array.
    Export(ExportCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config file selection shared by commands.
#[derive(Args, Debug)]
struct ConfigArg {
    /// Config file path (defaults to `POLYGLOT_CONFIG` or `polyglot.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `seed`.
#[derive(Args, Debug)]
struct SeedCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArg,
    /// Number of entries to generate.
    #[arg(long, default_value_t = 100_000)]
    count: usize,
    /// Entries written per transaction.
    #[arg(long, default_value_t = 5_000)]
    batch_size: usize,
    /// Fixed random seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

/// Arguments for `export`.
#[derive(Args, Debug)]
struct ExportCommand {
    /// Config file selection.
    #[command(flatten)]
    config: ConfigArg,
    /// Output file (stdout when omitted).
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(ConfigArg),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a display message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Seed(command) => command_seed(&command),
        Commands::Export(command) => command_export(&command),
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => command_config_validate(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ConfigArg) -> CliResult<ExitCode> {
    let config = load_config(&command)?;
    let server = tokio::task::spawn_blocking(move || ApiServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `seed` command.
fn command_seed(command: &SeedCommand) -> CliResult<ExitCode> {
    if command.count > MAX_SEED_COUNT {
        return Err(CliError::new(format!("--count must be at most {MAX_SEED_COUNT}")));
    }
    if !(1..=MAX_SEED_BATCH).contains(&command.batch_size) {
        return Err(CliError::new(format!("--batch-size must be between 1 and {MAX_SEED_BATCH}")));
    }
    let config = load_config(&command.config)?;
    if config.store.store_type != StoreType::Sqlite {
        return Err(CliError::new("seed requires a sqlite store".to_string()));
    }
    let catalog = open_catalog(&config)?;
    let mut generator = SeedGenerator::new(command.seed);
    let mut inserted = 0usize;
    while inserted < command.count {
        let size = command.batch_size.min(command.count - inserted);
        let batch = generator.batch(size);
        inserted += catalog.import_batch(batch).map_err(|err| {
            CliError::new(format!("seed failed after {inserted} entries: {err}"))
        })?;
    }
    write_stdout_line(&format!("seeded {inserted} entries"))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `export` command.
fn command_export(command: &ExportCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let catalog = open_catalog(&config)?;
    let entries = collect_entries(&catalog)?;
    let mut bytes = serde_json::to_vec_pretty(&entries)
        .map_err(|err| CliError::new(format!("export encode failed: {err}")))?;
    bytes.push(b'\n');
    match &command.output {
        Some(path) => write_file(path, &bytes)?,
        None => std::io::stdout()
            .write_all(&bytes)
            .map_err(|err| CliError::new(output_error("stdout", &err)))?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config validate` command.
fn command_config_validate(command: &ConfigArg) -> CliResult<ExitCode> {
    load_config(command)?;
    write_stdout_line("ok")?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(command: &ConfigArg) -> CliResult<PolyglotConfig> {
    PolyglotConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Opens the configured translation store behind the catalog service.
fn open_catalog(config: &PolyglotConfig) -> CliResult<TranslationCatalog<SharedTranslationStore>> {
    let (translations, _) = build_stores(&config.store)
        .map_err(|err| CliError::new(format!("store open failed: {err}")))?;
    Ok(TranslationCatalog::new(translations))
}

/// Pages through the whole catalog in id order.
fn collect_entries(
    catalog: &TranslationCatalog<SharedTranslationStore>,
) -> CliResult<Vec<EntryView>> {
    let mut entries = Vec::new();
    let mut after = None;
    loop {
        let page = catalog
            .export_page(after, MAX_EXPORT_PAGE_SIZE)
            .map_err(|err| CliError::new(format!("export failed: {err}")))?;
        entries.extend(page.entries);
        match page.next_after {
            Some(next) => after = Some(next),
            None => return Ok(entries),
        }
    }
}

/// Writes bytes to a file, replacing any previous contents.
fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    fs::write(path, bytes)
        .map_err(|err| CliError::new(format!("write {} failed: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
