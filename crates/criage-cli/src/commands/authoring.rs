//! `create`, `build` and `publish`

use std::path::PathBuf;

use criage_archive::ArchiveFormat;

use super::CommandContext;
use crate::output::format_size;

pub async fn create(name: &str, author: &str, description: &str, ctx: &CommandContext) -> anyhow::Result<()> {
    let dir = ctx
        .manager
        .create_package(&ctx.cwd, name, author, description)
        .await?;
    ctx.output
        .success(&format!("Created package {} in {}", name, dir.display()));
    Ok(())
}

pub async fn build(
    output: Option<PathBuf>,
    format: ArchiveFormat,
    level: Option<i32>,
    ctx: &CommandContext,
) -> anyhow::Result<()> {
    let output = output.map(|path| ctx.cwd.join(path));
    let built = ctx
        .manager
        .build_package(&ctx.cwd, output.as_deref(), format, level)
        .await?;
    ctx.output.success(&format!(
        "Built {} {} -> {} ({})",
        built.manifest.name,
        built.manifest.version,
        built.path.display(),
        format_size(built.size)
    ));
    Ok(())
}

pub async fn publish(registry: Option<&str>, token: Option<&str>, ctx: &CommandContext) -> anyhow::Result<()> {
    let uploaded = ctx.manager.publish_package(&ctx.cwd, registry, token).await?;
    ctx.output.success(&format!(
        "Published {} ({})",
        uploaded.filename,
        format_size(uploaded.size)
    ));
    if !uploaded.message.is_empty() {
        ctx.output.info(&uploaded.message);
    }
    Ok(())
}
