//! Error types for saltldap

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::template::TemplateError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to bind to LDAP server {server}:{port} as {bind_dn}")]
    Connection {
        server: String,
        port: u16,
        bind_dn: String,
        #[source]
        source: DirectoryError,
    },

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}
