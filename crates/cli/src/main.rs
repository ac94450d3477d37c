mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Rule tree validator and SQL compiler.
#[derive(Parser)]
#[command(name = "rulebook", version, about = "Rule tree validator and SQL compiler")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Configuration file (default: ./rulebook.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a rule's semantics against the catalogs
    Validate {
        /// Path to the rule JSON file
        rule: PathBuf,
        /// Directory of stored rules used to resolve references
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Compile a rule to a SQL fragment
    Compile {
        /// Path to the rule JSON file
        rule: PathBuf,
        /// Directory of stored rules used to resolve references
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Compile without running semantic validation first
        #[arg(long)]
        skip_validation: bool,
    },

    /// Print the effective catalog as JSON
    Catalog {
        /// Print only the function catalog
        #[arg(long)]
        functions: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output only.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match config::Config::discover(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    tracing::debug!(source = ?config.source(), "configuration loaded");

    match cli.command {
        Commands::Validate { rule, rules } => {
            commands::validate::cmd_validate(&rule, rules.as_deref(), &config, cli.output, cli.quiet);
        }
        Commands::Compile {
            rule,
            rules,
            skip_validation,
        } => {
            commands::compile::cmd_compile(
                &rule,
                rules.as_deref(),
                skip_validation,
                &config,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Catalog { functions } => {
            commands::catalog::cmd_catalog(functions, &config, cli.output, cli.quiet);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
