//! # criage-cli
//!
//! Command-line interface for the criage package manager.
//!
//! Parses the command line, sets up logging and the panic hook, loads the
//! configuration and hands the command to the package manager.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use criage_archive::ArchiveFormat;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ", ",
    env!("RUSTC_VERSION"),
    ")"
);

/// Package manager for criage repositories
#[derive(Parser, Debug)]
#[command(name = "criage", version, long_version = LONG_VERSION, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CRIAGE_LOG_JSON")]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a package
    Install {
        name: String,
        /// Exact version instead of the latest one
        #[arg(long = "version", value_name = "VERSION")]
        version: Option<String>,
        #[arg(short, long)]
        global: bool,
        /// Reinstall over an existing install
        #[arg(short, long)]
        force: bool,
        #[arg(long)]
        arch: Option<String>,
        #[arg(long)]
        os: Option<String>,
    },
    /// Remove an installed package
    Uninstall {
        name: String,
        #[arg(short, long)]
        global: bool,
        #[arg(long)]
        purge: bool,
    },
    /// Update a package to its latest version
    Update { name: String },
    /// Search every enabled repository
    Search { query: String },
    /// List installed packages
    List {
        #[arg(short, long)]
        global: bool,
        #[arg(long)]
        outdated: bool,
    },
    /// Show an installed package
    Info {
        name: String,
        #[arg(short, long)]
        global: bool,
    },
    /// Scaffold a new package in the current directory
    Create {
        name: String,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Build the package in the current directory
    Build {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "tar.zst")]
        format: ArchiveFormat,
        /// Compression level; the configured level when absent
        #[arg(long)]
        level: Option<i32>,
    },
    /// Build and upload the package in the current directory
    Publish {
        /// Repository name or URL
        #[arg(long)]
        registry: Option<String>,
        #[arg(long, env = "CRIAGE_PUBLISH_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Query a repository directly
    Repo(RepoArgs),
}

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Repository name or URL; the highest-priority one when absent
    #[arg(short, long, global = true)]
    pub repository: Option<String>,

    #[command(subcommand)]
    pub command: RepoCommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Show what the repository says about itself
    Info,
    /// Show repository statistics
    Stats,
    /// Rebuild the repository index
    Refresh {
        #[arg(long, hide_env_values = true)]
        token: Option<String>,
    },
    /// List the repository's packages
    Packages {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show one published version
    Version { name: String, version: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.json_logs);
    setup_panic_handler();

    tracing::debug!("criage v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let ctx = CommandContext::new().await?;
        let result = commands::dispatch_command(cli.command, &ctx).await;
        ctx.manager.shutdown();
        result
    })
}

fn setup_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,criage={level},criage_core={level},criage_config={level},\
             criage_registry={level},criage_archive={level},criage_store={level},\
             criage_resolver={level},criage_manager={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("criage encountered an unexpected error: {}", panic_info);
        eprintln!("criage crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
