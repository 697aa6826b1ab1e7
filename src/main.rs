use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use directories::BaseDirs;
use tracing::{debug, trace, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::path::{Path, PathBuf};

use uabench::commands::{self, AnalyzeRequest};
use uabench::configuration::config_file_path;
use uabench::report::ReportOptions;
use uabench::UaBenchConfig;

/// Benchmark user-agent parsers against expected results and each other.
#[derive(Parser)]
#[clap(author, version = clap::crate_version!(), max_term_width = 100, about)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Increase logging level
    #[clap(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to custom config file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every parser of a run and print the report
    Analyze {
        /// Run to analyze (defaults to the latest)
        #[clap(long)]
        run: Option<String>,

        /// Test suites to analyze (repeatable)
        #[clap(short, long = "suite")]
        suites: Vec<String>,

        /// Parsers to analyze, in report order (repeatable)
        #[clap(short, long = "parser")]
        parsers: Vec<String>,

        /// Use a parser's output as ground truth instead of the corpora
        #[clap(long)]
        comparison_only: bool,

        /// Ground-truth parser for --comparison-only
        #[clap(long, requires = "comparison_only")]
        reference: Option<String>,

        /// Show the expected-vs-actual distribution per field
        #[clap(short, long)]
        details: bool,

        /// Only show distribution rows with a mismatch
        #[clap(long, requires = "details")]
        failures_only: bool,

        /// List every failing test case
        #[clap(long)]
        diff: bool,

        /// Also write the report as JSON
        #[clap(long, value_name = "PATH")]
        json: Option<PathBuf>,
    },
    /// Lists the runs in the result store
    Runs,
    /// Shows how a raw value normalizes
    Normalize {
        /// Section: client, engine, platform or device
        section: String,
        /// Field within the section
        field: String,
        /// Raw value (`true`, `false` and `null` are read as such)
        value: String,
        /// Platform version, for platform names that include it
        #[clap(long)]
        version: Option<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn load_config(path: Option<&Path>) -> Result<UaBenchConfig, anyhow::Error> {
    let dir = BaseDirs::new().context("Failed to get base directories")?;
    let config_file = config_file_path(path, dir.home_dir());
    let config = UaBenchConfig::load_from(&config_file)?;
    trace!("{:?}", config);
    Ok(config)
}

fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Show help when no command is provided
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    if let Commands::Completions { shell } = &command {
        generate(*shell, &mut Cli::command(), "uabench", &mut std::io::stdout());
        return Ok(());
    }

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    debug!("Argument parsing complete.");
    let config = load_config(cli.config.as_deref())?;

    match command {
        Commands::Analyze {
            run,
            suites,
            parsers,
            comparison_only,
            reference,
            details,
            failures_only,
            diff,
            json,
        } => {
            debug!("uabench analyze");
            let request = AnalyzeRequest {
                run,
                suites,
                parsers,
                comparison_only,
                reference,
                report: ReportOptions {
                    details,
                    failures_only,
                    diff,
                },
                json,
            };
            commands::analyze_command(&config, &request)?;
        }
        Commands::Runs => {
            debug!("uabench runs");
            commands::runs_command(&config)?;
        }
        Commands::Normalize {
            section,
            field,
            value,
            version,
        } => {
            commands::normalize_command(&config, &section, &field, &value, version.as_deref())?;
        }
        Commands::Completions { .. } => {
            unreachable!("Completions should be handled before this point");
        }
    }

    Ok(())
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
