//! LDAP authentication for saltldap
//!
//! Bind-and-search authentication plus the `ldap3`-backed
//! [`Directory`](saltldap_core::Directory) implementation shared with the
//! pillar source.

pub mod ldap;

pub use ldap::{LdapAuthResult, LdapAuthenticator, LdapDirectory};
