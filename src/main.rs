//! Snykboard - Snyk issue dashboard toolkit
//!
//! A CLI tool that pulls issue data from the Snyk APIs, flattens it into
//! a tabular CSV, and derives chart-ready JSON figures (per-title scatter
//! and created-vs-resolved activity lines).
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, bad input file, etc.)

mod api;
mod chart;
mod cli;
mod config;
mod export;
mod models;
mod transform;

use anyhow::{Context, Result};
use api::{filter_targets_by_integration, SnykClient};
use cli::{Args, Command};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::Issue;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use transform::{FlatRecord, FlattenOptions, NestedKeys, Scalar};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Snykboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the command
    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default snykboard.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to customize endpoints, API version, and output paths.");
    println!("   Credentials stay in the environment: SNYK_API_TOKEN, SNYK_ORG_ID.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Dispatch the parsed subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command.clone() {
        Command::Fetch {
            output,
            namespace_nested,
        } => run_fetch(&args, &config, output, namespace_nested).await,
        Command::Activity {
            input,
            output,
            cumulative,
        } => run_activity(&args, &config, input, output, cumulative).await,
        Command::Scatter { input, output } => run_scatter(&config, input, output),
        Command::PrChecks {
            integration_id,
            source_type,
        } => run_pr_checks(&args, &config, integration_id, source_type).await,
        Command::InitConfig => unreachable!("handled before logging init"),
    }
}

/// Fetch issues, flatten them, write the flat CSV.
async fn run_fetch(
    args: &Args,
    config: &Config,
    output: Option<PathBuf>,
    namespace_nested: bool,
) -> Result<()> {
    let client = SnykClient::new(config.api_config(args)?)?;

    println!("📥 Fetching issues from Snyk...");
    let spinner = make_spinner(!args.quiet, "Calling Snyk REST API...");
    let fetched = client.list_raw_issues().await;
    finish_spinner(spinner);
    let raw_issues = fetched?;

    let options = FlattenOptions {
        nested_keys: if namespace_nested {
            NestedKeys::PathPrefix
        } else {
            NestedKeys::Merge
        },
    };

    let mut records: Vec<FlatRecord> = Vec::with_capacity(raw_issues.len());
    for issue in &raw_issues {
        // Flatten the attributes object; the top-level id rides along as
        // its own column.
        let mut flat = match issue.get("attributes").and_then(Value::as_object) {
            Some(attributes) => transform::flatten_with(attributes, &options)?,
            None => FlatRecord::new(),
        };
        if let Some(id) = issue.get("id").and_then(Value::as_str) {
            flat.insert("id".to_string(), Scalar::from(id));
        }
        records.push(flat);
    }

    let path = output.unwrap_or_else(|| PathBuf::from(&config.output.csv));
    export::write_csv_file(&records, &path)?;

    println!(
        "✅ {} issues (flattened) written to {}",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Build the created-vs-resolved activity figure.
async fn run_activity(
    args: &Args,
    config: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    cumulative: bool,
) -> Result<()> {
    let issues: Vec<Issue> = match input {
        Some(ref path) => {
            info!("Reading issues from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let document: Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
            models::parse_issues_document(document)
        }
        None => {
            let client = SnykClient::new(config.api_config(args)?)?;
            println!("📥 Fetching issues from Snyk...");
            let spinner = make_spinner(!args.quiet, "Calling Snyk REST API...");
            let fetched = client.list_issues().await;
            finish_spinner(spinner);
            fetched?
        }
    };

    let series = transform::aggregate(&issues)?;

    if !series.skipped.is_empty() {
        println!(
            "⚠️  Skipped {} issues without usable timestamps",
            series.skipped.len()
        );
    }

    let figure = chart::activity_figure(&series, cumulative);
    let path = output.unwrap_or_else(|| PathBuf::from(&config.output.activity));
    chart::write_figure_file(&figure, &path)?;

    println!("\n📊 Activity Summary:");
    println!(
        "   Range: {} .. {} ({} days)",
        series.start,
        series.end,
        series.len()
    );
    println!(
        "   Created: {} | Resolved: {}",
        series.created.iter().sum::<u64>(),
        series.resolved.iter().sum::<u64>()
    );
    println!(
        "\n✅ {} figure written to {}",
        if cumulative { "Cumulative" } else { "Daily" },
        path.display()
    );
    Ok(())
}

/// Build the per-title scatter figure from the flat CSV.
fn run_scatter(config: &Config, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| PathBuf::from(&config.output.csv));

    info!("Reading flat records from {}", input.display());
    let records = export::read_csv_file(&input)?;
    let groups = chart::scatter_by_title(&records);

    let figure = chart::scatter_figure(&groups);
    let path = output.unwrap_or_else(|| PathBuf::from(&config.output.scatter));
    chart::write_figure_file(&figure, &path)?;

    println!(
        "✅ {} titles plotted from {} rows, figure written to {}",
        groups.len(),
        records.len(),
        path.display()
    );
    Ok(())
}

/// Check pull-request testing and list the integration's targets.
async fn run_pr_checks(
    args: &Args,
    config: &Config,
    integration_id: Option<String>,
    source_type: Option<String>,
) -> Result<()> {
    let integration_id = integration_id
        .context("Integration id not set (use --integration-id or SNYK_INTEGRATION_ID)")?;
    let source_type = source_type.unwrap_or_else(|| config.api.source_type.clone());

    let client = SnykClient::new(config.api_config(args)?)?;

    println!("🔎 Checking integration settings...");
    let settings = client.integration_settings(&integration_id).await?;

    if !settings.pull_request_test_enabled {
        println!("Pull request testing is not enabled.");
        return Ok(());
    }
    println!("Pull request testing is enabled.");

    let spinner = make_spinner(!args.quiet, "Listing targets...");
    let fetched = client.list_targets(&source_type).await;
    finish_spinner(spinner);
    let targets = fetched?;

    let matching = filter_targets_by_integration(targets, &integration_id);
    if matching.is_empty() {
        println!("No targets found for the specified source type and integration.");
    } else {
        println!("Targets filtered by integration id:\n");
        for target in &matching {
            println!("  📦 {}", target.label());
        }
        println!("\n   Total: {} targets", matching.len());
    }
    Ok(())
}

/// Create a spinner for a network call, unless quiet.
fn make_spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}
