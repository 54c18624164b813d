//! `repo` subcommands

use anyhow::Context as _;

use super::CommandContext;
use crate::output::format_size;
use crate::{RepoArgs, RepoCommand};

pub async fn execute(args: RepoArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let target = args.repository.as_deref();
    let manager = &ctx.manager;
    let out = &ctx.output;

    match args.command {
        RepoCommand::Info => {
            let info = manager.repository_info(target).await?;
            let rendered =
                serde_json::to_string_pretty(&info).context("Failed to render repository info")?;
            out.line(&rendered);
        },
        RepoCommand::Stats => {
            let stats = manager.repository_stats(target).await?;
            out.field("Packages", &stats.total_packages.to_string());
            out.field("Downloads", &stats.total_downloads.to_string());
            if !stats.popular_packages.is_empty() {
                out.field("Popular", &stats.popular_packages.join(", "));
            }
            for (license, count) in &stats.packages_by_license {
                out.field(license, &count.to_string());
            }
        },
        RepoCommand::Refresh { token } => {
            let refreshed = manager.refresh_index(target, token.as_deref()).await?;
            out.success(&format!(
                "Index refreshed: {} package(s)",
                refreshed.total_packages
            ));
        },
        RepoCommand::Packages { page, limit } => {
            let listing = manager.list_repository_packages(target, page, limit).await?;
            for package in &listing.packages {
                let latest = package
                    .latest_version()
                    .map(|v| v.version.as_str())
                    .unwrap_or("-");
                out.line(&format!("{} {}  {}", package.name, latest, package.description));
            }
            out.info(&format!(
                "page {} ({} per page), {} package(s) in total",
                listing.page, listing.limit, listing.total
            ));
        },
        RepoCommand::Version { name, version } => {
            let found = manager.version_info(target, &name, &version).await?;
            out.field("Version", &found.version);
            out.field("Description", &found.description);
            out.field("Downloads", &found.downloads.to_string());
            for file in &found.files {
                out.line(&format!(
                    "  {}/{}  {}  {}",
                    file.os,
                    file.arch,
                    file.filename,
                    format_size(file.size)
                ));
            }
        },
    }
    Ok(())
}
