//! Configuration for saltldap
//!
//! Example config:
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [auth]
//! server = "ldap.acme.local"
//! port = 389
//! tls = true
//! scope = 2
//! basedn = "o=acme,c=gb"
//! binddn = "uid=admin,o=acme,c=gb"
//! bindpw = "sssssh"
//! filter = "emailAddress={{ username }}"
//!
//! [pillar]
//! config_file = "/etc/salt/pillar_ldap.yaml"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{deserialize_port, ConnectionParams, Scope};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaltLdapConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub pillar: PillarSection,
}

impl SaltLdapConfig {
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::InvalidConfig(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();

        if let Ok(server) = std::env::var("SALTLDAP_SERVER") {
            config.auth.server = server;
        }
        if let Ok(port) = std::env::var("SALTLDAP_PORT") {
            config.auth.port = port
                .parse()
                .map_err(|_| crate::Error::InvalidConfig(format!("Invalid port: {}", port)))?;
        }
        if let Ok(tls) = std::env::var("SALTLDAP_TLS") {
            config.auth.tls = matches!(tls.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(scope) = std::env::var("SALTLDAP_SCOPE") {
            config.auth.scope = scope.parse().map_err(crate::Error::InvalidConfig)?;
        }
        if let Ok(base_dn) = std::env::var("SALTLDAP_BASEDN") {
            config.auth.base_dn = base_dn;
        }
        if let Ok(bind_dn) = std::env::var("SALTLDAP_BINDDN") {
            config.auth.bind_dn = bind_dn;
        }
        if let Ok(bind_password) = std::env::var("SALTLDAP_BINDPW") {
            config.auth.bind_password = bind_password;
        }
        if let Ok(filter) = std::env::var("SALTLDAP_FILTER") {
            config.auth.filter = filter;
        }
        if let Ok(timeout) = std::env::var("SALTLDAP_TIMEOUT") {
            let secs = timeout
                .parse()
                .map_err(|_| crate::Error::InvalidConfig(format!("Invalid timeout: {}", timeout)))?;
            config.auth.timeout_seconds = Some(secs);
        }
        if let Ok(level) = std::env::var("SALTLDAP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("SALTLDAP_LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Ok(path) = std::env::var("SALTLDAP_PILLAR_CONFIG") {
            config.pillar.config_file = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Copy suitable for printing, with secrets replaced
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        if !config.auth.bind_password.is_empty() {
            config.auth.bind_password = "***".to_string();
        }
        config
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Settings for the LDAP authenticator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,

    /// Upgrade with STARTTLS before binding
    #[serde(default)]
    pub tls: bool,

    #[serde(default)]
    pub scope: Scope,

    /// Base DN for the user search
    #[serde(default, alias = "basedn")]
    pub base_dn: String,

    /// Service account used for the user search
    #[serde(default, alias = "binddn")]
    pub bind_dn: String,

    #[serde(default, alias = "bindpw")]
    pub bind_password: String,

    /// User search filter, `{{ username }}` is substituted
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Connect timeout; the LDAP library default applies when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_server() -> String {
    crate::DEFAULT_SERVER.to_string()
}

fn default_port() -> u16 {
    crate::DEFAULT_PORT
}

fn default_filter() -> String {
    "emailAddress={{ username }}".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            tls: false,
            scope: Scope::default(),
            base_dn: String::new(),
            bind_dn: String::new(),
            bind_password: String::new(),
            filter: default_filter(),
            timeout_seconds: None,
        }
    }
}

impl AuthConfig {
    /// Connection parameters for the service bind
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            server: self.server.clone(),
            port: self.port,
            tls: self.tls,
            bind_dn: self.bind_dn.clone(),
            bind_password: self.bind_password.clone(),
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.server.trim().is_empty() {
            return Err(crate::Error::InvalidConfig("Server is required".into()));
        }

        if self.port == 0 {
            return Err(crate::Error::InvalidConfig("Port must be non-zero".into()));
        }

        if self.base_dn.trim().is_empty() {
            return Err(crate::Error::InvalidConfig("Base DN is required".into()));
        }

        if self.filter.trim().is_empty() {
            return Err(crate::Error::InvalidConfig("Filter is required".into()));
        }

        Ok(())
    }
}

// ============================================================================
// Pillar
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PillarSection {
    /// Default pillar config file when none is given on the command line
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
