//! kubexplain CLI - explain and validate Kubernetes manifests field by field

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod input;
mod settings;

use commands::Context;
use error::Result;
use settings::Settings;

#[derive(Parser)]
#[command(name = "kubexplain")]
#[command(author = "kubexplain Contributors")]
#[command(version)]
#[command(about = "Explain and validate Kubernetes manifests field by field", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (default: <config dir>/kubexplain/config.yaml)
    #[arg(long, global = true, env = "KUBEXPLAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Rules overlay file extending the built-in rules
    #[arg(long, global = true)]
    rules: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a manifest and list the resources found
    Parse {
        /// Manifest file, or `-` for stdin
        file: PathBuf,
    },

    /// Explain every recognized field of a manifest
    Explain {
        /// Manifest file, or `-` for stdin
        file: PathBuf,

        /// Narrative text (e.g. from a language model) to blend into the summary
        #[arg(long)]
        narrative_file: Option<PathBuf>,

        /// Print the prompt an external narrative writer would receive
        #[arg(long)]
        prompt: bool,
    },

    /// Validate a manifest
    Validate {
        /// Manifest file, or `-` for stdin
        file: PathBuf,

        /// Strict mode - treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let settings = Settings::load(cli.config.as_deref())?;
    let strict = matches!(cli.command, Commands::Validate { strict: true, .. });
    let ctx = Context::resolve(settings, cli.json, strict, cli.rules.as_deref())?;

    match cli.command {
        Commands::Parse { file } => commands::parse::run(&ctx, &file),
        Commands::Explain {
            file,
            narrative_file,
            prompt,
        } => commands::explain::run(&ctx, &file, narrative_file.as_deref(), prompt),
        Commands::Validate { file, .. } => commands::validate::run(&ctx, &file),
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.debug);

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}
