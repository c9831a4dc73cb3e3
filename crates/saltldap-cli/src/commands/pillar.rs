//! pillar command - print LDAP pillar data as JSON

use super::CommandContext;
use anyhow::{bail, Context, Result};
use saltldap_auth::LdapDirectory;
use saltldap_core::JinjaRenderer;
use saltldap_pillar::LdapPillar;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

pub async fn execute(
    ctx: &CommandContext,
    config_file: Option<PathBuf>,
    grains: Option<PathBuf>,
    minion_id: Option<String>,
    pretty: bool,
) -> Result<ExitCode> {
    let config_file = match config_file.or_else(|| ctx.config.pillar.config_file.clone()) {
        Some(path) => path,
        None => bail!("No pillar config file given. Pass one or set [pillar] config_file"),
    };

    let grains = load_grains(grains.as_deref(), minion_id)?;

    let directory = match ctx.config.auth.timeout_seconds {
        Some(secs) => LdapDirectory::with_timeout(Duration::from_secs(secs)),
        None => LdapDirectory::new(),
    };
    let pillar = LdapPillar::new(Arc::new(directory), Arc::new(JinjaRenderer::new()));
    let data = pillar.fetch(&config_file, &grains).await?;

    let output = if pretty {
        serde_json::to_string_pretty(&data)?
    } else {
        serde_json::to_string(&data)?
    };
    println!("{}", output);

    Ok(ExitCode::SUCCESS)
}

/// Grains from a JSON object file, with `id` set from the minion id
fn load_grains(path: Option<&Path>, minion_id: Option<String>) -> Result<Value> {
    let mut grains = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read grains file: {}", path.display()))?;
            match serde_json::from_str::<Value>(&content)
                .with_context(|| format!("Failed to parse grains file: {}", path.display()))?
            {
                Value::Object(map) => map,
                _ => bail!("Grains file must contain a JSON object: {}", path.display()),
            }
        }
        None => Map::new(),
    };

    if let Some(id) = minion_id {
        grains.insert("id".to_string(), Value::String(id));
    }

    Ok(Value::Object(grains))
}
