//! `install`, `uninstall`, `update`, `search`, `list` and `info`

use criage_core::error::CriageError;
use criage_core::types::{InstalledPackage, Scope};
use criage_manager::InstallOptions;

use super::CommandContext;
use crate::output::format_size;

pub async fn install(name: &str, options: &InstallOptions, ctx: &CommandContext) -> anyhow::Result<()> {
    let record = ctx.manager.install(name, options).await?;
    ctx.output.success(&format!(
        "Installed {} {} ({}, {})",
        record.name,
        record.version,
        record.scope,
        format_size(record.size)
    ));
    Ok(())
}

pub async fn uninstall(name: &str, global: bool, purge: bool, ctx: &CommandContext) -> anyhow::Result<()> {
    let record = ctx
        .manager
        .uninstall(name, Scope::from_global(global), purge)
        .await?;
    ctx.output
        .success(&format!("Removed {} {} ({})", record.name, record.version, record.scope));
    Ok(())
}

pub async fn update(name: &str, ctx: &CommandContext) -> anyhow::Result<()> {
    match ctx.manager.update(name).await {
        Ok(record) => {
            ctx.output
                .success(&format!("Updated {} to {}", record.name, record.version));
            Ok(())
        },
        Err(CriageError::AlreadyCurrent { name, version }) => {
            ctx.output
                .info(&format!("{} is already at the latest version ({})", name, version));
            Ok(())
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn search(query: &str, ctx: &CommandContext) -> anyhow::Result<()> {
    let results = ctx.manager.search(query).await;
    if results.is_empty() {
        ctx.output.warn(&format!("No packages found for '{}'", query));
        return Ok(());
    }

    for hit in &results {
        ctx.output.line(&format!("{} {}  {}", hit.name, hit.version, hit.description));
    }
    ctx.output.info(&format!("{} result(s)", results.len()));
    Ok(())
}

pub fn list(global: bool, outdated: bool, ctx: &CommandContext) -> anyhow::Result<()> {
    let scope = Scope::from_global(global);
    let records = ctx.manager.list(scope, outdated);
    if records.is_empty() {
        ctx.output.info(&format!("No {} packages installed", scope));
        return Ok(());
    }

    for record in &records {
        ctx.output.line(&format!(
            "{} {}  {}  {}",
            record.name,
            record.version,
            format_size(record.size),
            record.description
        ));
    }
    Ok(())
}

pub fn info(name: &str, global: bool, ctx: &CommandContext) -> anyhow::Result<()> {
    let record = ctx.manager.info(name, Scope::from_global(global))?;
    print_record(&record, ctx);
    Ok(())
}

fn print_record(record: &InstalledPackage, ctx: &CommandContext) {
    let out = &ctx.output;
    out.field("Name", &record.name);
    out.field("Version", &record.version);
    out.field("Description", &record.description);
    out.field("Author", &record.author);
    out.field("License", &record.license);
    out.field("Scope", record.scope.as_str());
    out.field("Installed", &record.install_date.format("%Y-%m-%d %H:%M:%S").to_string());
    out.field("Path", &record.install_path.display().to_string());
    out.field("Size", &format_size(record.size));
    if !record.dependencies.is_empty() {
        let deps: Vec<String> = record
            .dependencies
            .iter()
            .map(|(name, range)| format!("{} {}", name, range))
            .collect();
        out.field("Dependencies", &deps.join(", "));
    }
}
