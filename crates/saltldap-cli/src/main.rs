//! saltldap - LDAP authentication and external pillar for Salt
//!
//! `saltldap auth` checks credentials with a bind-and-search against the
//! configured directory. `saltldap pillar` prints pillar data as JSON for
//! Salt's `cmd_json` external pillar.

mod commands;

use clap::{Parser, Subcommand};
use commands::CommandContext;
use saltldap_core::config::{LoggingConfig, SaltLdapConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "saltldap")]
#[command(version = saltldap_core::VERSION)]
#[command(about = "LDAP authentication and external pillar for Salt", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SALTLDAP_CONFIG")]
    config: Option<PathBuf>,

    /// LDAP server host
    #[arg(long, global = true)]
    server: Option<String>,

    /// LDAP server port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate a user against the directory
    Auth {
        /// Username substituted into the search filter
        username: String,

        /// Password; read from the first line of stdin when omitted
        #[arg(long, env = "SALTLDAP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Run the pillar searches and print the merged data as JSON
    Pillar {
        /// Pillar config file (YAML template)
        config_file: Option<PathBuf>,

        /// JSON file with the minion's grains
        #[arg(long)]
        grains: Option<PathBuf>,

        /// Minion id, available to the template as `id`
        #[arg(long)]
        minion_id: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate the configuration and print it with secrets masked
    CheckConfig,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(commands::EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load or create config
    let mut config = if let Some(config_path) = &cli.config {
        SaltLdapConfig::from_file(config_path)?
    } else {
        SaltLdapConfig::from_env()?
    };

    // Override with CLI args
    if let Some(server) = cli.server {
        config.auth.server = server;
    }
    if let Some(port) = cli.port {
        config.auth.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging);

    let ctx = CommandContext { config };

    match cli.command {
        Commands::Auth { username, password } => {
            commands::auth::execute(&ctx, &username, password).await
        }
        Commands::Pillar {
            config_file,
            grains,
            minion_id,
            pretty,
        } => commands::pillar::execute(&ctx, config_file, grains, minion_id, pretty).await,
        Commands::CheckConfig => commands::check_config::execute(&ctx),
        Commands::Version => {
            println!("saltldap {}", saltldap_core::VERSION);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr; stdout carries command output only
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
