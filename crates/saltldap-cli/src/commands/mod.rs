//! CLI command implementations

pub mod auth;
pub mod check_config;
pub mod pillar;

use saltldap_core::config::SaltLdapConfig;

/// Exit status when authentication is refused
pub const EXIT_DENIED: u8 = 1;

/// Exit status for configuration or directory errors
pub const EXIT_ERROR: u8 = 2;

/// Context passed to all commands
pub struct CommandContext {
    pub config: SaltLdapConfig,
}
