//! saltldap Core Library
//!
//! Configuration, shared types, the directory capability and template
//! rendering used by the saltldap authenticator and pillar source.

pub mod config;
pub mod directory;
pub mod error;
pub mod template;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{AuthConfig, SaltLdapConfig};
pub use directory::{Directory, DirectoryError, DirectoryResult, DirectorySession};
pub use error::{Error, Result};
pub use template::{JinjaRenderer, TemplateError, TemplateRenderer};
pub use types::{ConnectionParams, PillarData, PillarValue, Scope, SearchEntry, SearchSpec};

/// saltldap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default LDAP port
pub const DEFAULT_PORT: u16 = 389;

/// Default LDAP server host
pub const DEFAULT_SERVER: &str = "localhost";
