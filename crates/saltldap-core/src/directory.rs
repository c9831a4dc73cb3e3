//! Directory capability
//!
//! Defines the bind/search/unbind interface the authenticator and the
//! pillar source talk to. The LDAP implementation lives in
//! `saltldap-auth`; an in-memory one is available with the `testing`
//! feature.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ConnectionParams, SearchEntry, SearchSpec};

/// Result type for directory operations
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// LDAP result code for invalid credentials
pub const RC_INVALID_CREDENTIALS: u32 = 49;

/// LDAP result code for an unwilling server, used for disabled or locked accounts
pub const RC_UNWILLING_TO_PERFORM: u32 = 53;

/// Directory errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The server answered the bind and refused it
    #[error("Bind rejected for {dn} (rc={rc}): {message}")]
    BindRejected { dn: String, rc: u32, message: String },

    /// Could not reach the server or the connection broke
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The search itself failed
    #[error("Search failed: {0}")]
    Search(String),
}

impl DirectoryError {
    /// True when the server refused the credentials
    pub fn is_rejection(&self) -> bool {
        matches!(self, DirectoryError::BindRejected { .. })
    }
}

/// Opens bound sessions against a directory server
#[async_trait]
pub trait Directory: Send + Sync {
    /// Connect and bind with the given credentials
    async fn bind(&self, params: &ConnectionParams) -> DirectoryResult<Box<dyn DirectorySession>>;
}

/// A bound directory connection
#[async_trait]
pub trait DirectorySession: Send {
    /// Run a search and return all entries
    async fn search(&mut self, spec: &SearchSpec) -> DirectoryResult<Vec<SearchEntry>>;

    /// Close the connection
    async fn unbind(self: Box<Self>) -> DirectoryResult<()>;
}
