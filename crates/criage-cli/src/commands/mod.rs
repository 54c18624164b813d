//! Command handlers and dispatch.
//!
//! Handlers are thin: they call the package manager and print the result.

use std::path::PathBuf;

use anyhow::Context as _;
use criage_config::{Config, ConfigLoader};
use criage_manager::{Context, PackageManager};
use tracing::{debug, info};

pub mod authoring;
pub mod lifecycle;
pub mod repo;


use crate::output::OutputHandler;
use crate::Commands;

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
    pub output: OutputHandler,
    pub manager: PackageManager,
}

impl CommandContext {
    /// Load `~/.criage` configuration and build the manager
    pub async fn new() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let loader = ConfigLoader::from_home()?;
        let (config, source) = loader
            .load()
            .await
            .with_context(|| format!("Failed to load configuration from {}", loader.config_dir()))?;
        debug!(?source, "using configuration");

        Self::with_config(cwd, config, OutputHandler::new())
    }

    pub fn with_config(cwd: PathBuf, config: Config, output: OutputHandler) -> anyhow::Result<Self> {
        let manager = PackageManager::new(Context::new(config)?);
        Ok(Self {
            cwd,
            output,
            manager,
        })
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Install {
            name,
            version,
            global,
            force,
            arch,
            os,
        } => {
            info!("Installing package: {}", name);
            let options = criage_manager::InstallOptions {
                version,
                global,
                force,
                os,
                arch,
            };
            lifecycle::install(&name, &options, ctx).await
        },
        Commands::Uninstall {
            name,
            global,
            purge,
        } => lifecycle::uninstall(&name, global, purge, ctx).await,
        Commands::Update { name } => lifecycle::update(&name, ctx).await,
        Commands::Search { query } => lifecycle::search(&query, ctx).await,
        Commands::List { global, outdated } => lifecycle::list(global, outdated, ctx),
        Commands::Info { name, global } => lifecycle::info(&name, global, ctx),
        Commands::Create {
            name,
            author,
            description,
        } => authoring::create(&name, &author, &description, ctx).await,
        Commands::Build {
            output,
            format,
            level,
        } => authoring::build(output, format, level, ctx).await,
        Commands::Publish { registry, token } => {
            authoring::publish(registry.as_deref(), token.as_deref(), ctx).await
        },
        Commands::Repo(args) => repo::execute(args, ctx).await,
    }
}
