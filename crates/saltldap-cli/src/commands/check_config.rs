//! check-config command - validate and show configuration

use super::CommandContext;
use anyhow::Result;
use std::process::ExitCode;

pub fn execute(ctx: &CommandContext) -> Result<ExitCode> {
    ctx.config.auth.validate()?;

    if let Some(path) = &ctx.config.pillar.config_file {
        if !path.is_file() {
            eprintln!("warning: pillar config file not found: {}", path.display());
        }
    }

    print!("{}", toml::to_string_pretty(&ctx.config.masked())?);
    Ok(ExitCode::SUCCESS)
}
