//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use contactpipe_core::{
    IngestOptions, IngestSummary, ProgressReporter, UploadOptions, UploadSummary, run_ingest,
    run_upload,
};
use contactpipe_shared::{
    AppConfig, init_config, load_config, load_config_from, validate_api_key, validate_source_token,
};
use contactpipe_source::SheetsClient;
use contactpipe_upload::CrmClient;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// contactpipe — spreadsheet rows in, CRM upserts out.
#[derive(Parser)]
#[command(
    name = "contactpipe",
    version,
    about = "Ingest, deduplicate, and deliver contact records to a CRM in batches.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path (defaults to ~/.contactpipe/contactpipe.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch, deduplicate, and normalize rows into the intermediate store.
    Ingest {
        /// Spreadsheet identifier (overrides config).
        #[arg(long)]
        sheet: Option<String>,

        /// Upper bound on rows considered (overrides config).
        #[arg(long)]
        row_cap: Option<u32>,

        /// Intermediate store path (overrides config).
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Validate stored contacts and submit them to the CRM in batches.
    Upload {
        /// Intermediate store path (overrides config).
        #[arg(long)]
        store: Option<PathBuf>,

        /// Maximum contacts per batch (overrides config).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Partition and report without submitting anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run ingest and upload back to back.
    Run {
        /// Spreadsheet identifier (overrides config).
        #[arg(long)]
        sheet: Option<String>,

        /// Upper bound on rows considered (overrides config).
        #[arg(long)]
        row_cap: Option<u32>,

        /// Intermediate store path (overrides config).
        #[arg(long)]
        store: Option<PathBuf>,

        /// Maximum contacts per batch (overrides config).
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contactpipe=info",
        1 => "contactpipe=debug",
        _ => "contactpipe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Command::Ingest {
            sheet,
            row_cap,
            store,
        } => {
            cmd_ingest(
                config_path.as_deref(),
                sheet.as_deref(),
                row_cap,
                store.as_deref(),
            )
            .await
        }
        Command::Upload {
            store,
            batch_size,
            dry_run,
        } => cmd_upload(config_path.as_deref(), store.as_deref(), batch_size, dry_run).await,
        Command::Run {
            sheet,
            row_cap,
            store,
            batch_size,
        } => {
            cmd_ingest(
                config_path.as_deref(),
                sheet.as_deref(),
                row_cap,
                store.as_deref(),
            )
            .await?;
            cmd_upload(config_path.as_deref(), store.as_deref(), batch_size, false).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

/// Load config from the override path or the default location.
fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ingest(
    config_path: Option<&Path>,
    sheet: Option<&str>,
    row_cap: Option<u32>,
    store: Option<&Path>,
) -> Result<()> {
    let mut config = load(config_path)?;
    if let Some(sheet) = sheet {
        config.source.sheet_id = sheet.to_string();
    }
    if let Some(cap) = row_cap {
        config.source.row_cap = cap;
    }

    // Fail fast on a missing token before any network traffic
    validate_source_token(&config)?;

    let store_path = store
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.pipeline.store_path));

    let source = SheetsClient::from_config(&config.source)?;
    let options = IngestOptions {
        store_path,
        reference_date: Utc::now().date_naive(),
    };

    info!(
        sheet_id = %config.source.sheet_id,
        row_cap = config.source.row_cap,
        "ingesting contact rows"
    );

    let reporter = CliProgress::new();
    let summary = run_ingest(&source, &options, &reporter).await?;
    reporter.finish();

    print_ingest_summary(&summary);
    Ok(())
}

async fn cmd_upload(
    config_path: Option<&Path>,
    store: Option<&Path>,
    batch_size: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    let mut config = load(config_path)?;
    if let Some(size) = batch_size {
        config.crm.max_batch_size = size;
    }

    let store_path = store
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.pipeline.store_path));

    // A dry run partitions and reports without touching the network, so it
    // needs no API key.
    let crm = if dry_run {
        CrmClient::new(
            &config.crm.base_url,
            &config.crm.upsert_path,
            "",
            config.crm.timeout_secs,
        )?
    } else {
        validate_api_key(&config)?;
        CrmClient::from_config(&config.crm)?
    };

    let options = UploadOptions {
        store_path,
        max_batch_size: config.crm.max_batch_size,
        dry_run,
    };

    info!(
        max_batch_size = options.max_batch_size,
        dry_run, "uploading contacts"
    );

    let reporter = CliProgress::new();
    let summary = run_upload(&crm, &options, &reporter).await?;
    reporter.finish();

    print_upload_summary(&summary);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary output
// ---------------------------------------------------------------------------

fn print_ingest_summary(summary: &IngestSummary) {
    println!();
    println!("  Ingest complete.");
    println!("  Run:       {}", summary.run_id);
    println!("  Rows seen: {}", summary.rows_seen);
    println!("  Admitted:  {}", summary.rows_admitted);
    match &summary.store_hash {
        Some(hash) => {
            println!("  Store:     {}", summary.store_path.display());
            println!("  SHA-256:   {hash}");
        }
        None => println!("  Store:     not written (no data found)"),
    }
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

fn print_upload_summary(summary: &UploadSummary) {
    println!();
    if summary.dry_run {
        println!("  Dry run — nothing submitted.");
    } else {
        println!("  Upload complete.");
    }
    println!("  Run:       {}", summary.run_id);
    println!("  Loaded:    {}", summary.records_loaded);
    println!("  Validated: {}", summary.records_validated);
    println!("  Rejected:  {}", summary.records_rejected);

    if summary.dry_run {
        println!(
            "  Planned:   {} batch(es) of sizes {:?}",
            summary.planned_batches.len(),
            summary.planned_batches
        );
    } else {
        println!("  Sent:      {}", summary.batches_sent());
        println!("  Failed:    {}", summary.batches_failed());
        for batch in &summary.batches {
            let status = batch
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "no response".into());
            let mark = if batch.success { "ok" } else { "FAILED" };
            println!(
                "    batch {} ({} contacts): {mark} [{status}]",
                batch.index + 1,
                batch.size
            );
        }
    }
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn row_admitted(&self, email: &str, admitted: usize) {
        self.spinner
            .set_message(format!("Admitted [{admitted}] {email}"));
    }

    fn batch_done(&self, current: usize, total: usize, success: bool) {
        let mark = if success { "ok" } else { "failed" };
        self.spinner
            .set_message(format!("Batch [{current}/{total}] {mark}"));
    }
}
