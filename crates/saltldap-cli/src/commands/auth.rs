//! auth command - check a username/password pair

use super::{CommandContext, EXIT_DENIED};
use anyhow::{Context, Result};
use saltldap_auth::LdapAuthenticator;
use std::io::BufRead;
use std::process::ExitCode;
use tracing::info;

pub async fn execute(ctx: &CommandContext, username: &str, password: Option<String>) -> Result<ExitCode> {
    ctx.config.auth.validate()?;

    let password = match password {
        Some(password) => password,
        None => read_password(std::io::stdin().lock())?,
    };

    let authenticator = LdapAuthenticator::with_ldap(ctx.config.auth.clone());
    let result = authenticator.authenticate(username, &password).await?;

    if let Some(dn) = result.dn() {
        info!("Authenticated {} as {}", username, dn);
        println!("true");
        Ok(ExitCode::SUCCESS)
    } else {
        info!("Authentication refused for {}: {:?}", username, result);
        println!("false");
        Ok(ExitCode::from(EXIT_DENIED))
    }
}

/// First line of input, without the line ending
fn read_password(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_password_strips_newline() {
        assert_eq!(read_password(&b"secret\n"[..]).unwrap(), "secret");
        assert_eq!(read_password(&b"secret\r\nignored\n"[..]).unwrap(), "secret");
        assert_eq!(read_password(&b" spaced "[..]).unwrap(), " spaced ");
        assert_eq!(read_password(&b""[..]).unwrap(), "");
    }
}
