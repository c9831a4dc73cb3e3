//! LDAP/Active Directory authentication module
//!
//! Features:
//! - Service bind, single-entry user search, confirmatory user bind
//! - STARTTLS support
//! - Filter escaping of user input

mod client;
mod connection;
mod types;

pub use client::LdapAuthenticator;
pub use connection::LdapDirectory;
pub use types::*;
