//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Snykboard - Snyk issue dashboard toolkit
///
/// Fetch Snyk issues into a flat CSV, build chart-ready activity and
/// scatter figures, and check integration pull-request-test settings.
///
/// Examples:
///   snykboard fetch
///   snykboard activity --input issues.json --cumulative
///   snykboard scatter --input snyk_issues_flat.csv
///   snykboard pr-checks --integration-id 8f69e502-9ba6-43a4-8fdb-2dc6dffe49c6
///   snykboard init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,

    /// Snyk API token
    ///
    /// Sent as a static `Authorization: token ...` header on every call.
    #[arg(long, env = "SNYK_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,

    /// Snyk organization id
    #[arg(long, env = "SNYK_ORG_ID", value_name = "UUID", global = true)]
    pub org_id: Option<String>,

    /// REST API version date
    ///
    /// Overrides the config file value (default 2024-04-29).
    #[arg(long, env = "SNYK_API_VERSION", value_name = "DATE", global = true)]
    pub api_version: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for snykboard.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch issues from the Snyk API, flatten them, write the flat CSV
    Fetch {
        /// Output CSV path (defaults to config `output.csv`)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Namespace nested keys by path (`resolution.status`) instead of
        /// merging them into the top level
        #[arg(long)]
        namespace_nested: bool,
    },

    /// Build the created-vs-resolved activity figure
    Activity {
        /// Issues JSON file; fetches from the API when omitted
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output figure JSON path (defaults to config `output.activity`)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit running totals instead of per-day counts
        #[arg(long)]
        cumulative: bool,
    },

    /// Build the per-title scatter figure from a flat CSV
    Scatter {
        /// Flat CSV input (defaults to config `output.csv`)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output figure JSON path (defaults to config `output.scatter`)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check pull-request testing and list the integration's targets
    PrChecks {
        /// Integration id whose settings and targets to inspect
        #[arg(long, env = "SNYK_INTEGRATION_ID", value_name = "UUID")]
        integration_id: Option<String>,

        /// Source type to list targets for (defaults to config `api.source_type`)
        #[arg(long, env = "SNYK_SOURCE_TYPE_NAME", value_name = "NAME")]
        source_type: Option<String>,
    },

    /// Generate a default snykboard.toml configuration file
    InitConfig,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate input files if provided
        let input = match self.command {
            Command::Activity { ref input, .. } => input.as_deref(),
            Command::Scatter { ref input, .. } => input.as_deref(),
            _ => None,
        };
        if let Some(input) = input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
