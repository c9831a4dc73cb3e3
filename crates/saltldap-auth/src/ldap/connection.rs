//! LDAP connections backed by `ldap3`
//!
//! One connection per bind; the connection driver is spawned on the
//! current tokio runtime and ends when the session is unbound or dropped.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, SearchEntry as RawEntry};
use saltldap_core::{
    ConnectionParams, Directory, DirectoryError, DirectoryResult, DirectorySession, Scope,
    SearchEntry, SearchSpec,
};
use std::time::Duration;
use tracing::debug;

/// Directory implementation that talks LDAPv3
#[derive(Debug, Clone, Default)]
pub struct LdapDirectory {
    timeout: Option<Duration>,
}

impl LdapDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how long connection setup may take
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn settings(&self, params: &ConnectionParams) -> LdapConnSettings {
        let settings = LdapConnSettings::new().set_starttls(params.tls);
        match self.timeout {
            Some(timeout) => settings.set_conn_timeout(timeout),
            None => settings,
        }
    }
}

fn ldap_scope(scope: Scope) -> ldap3::Scope {
    match scope {
        Scope::Base => ldap3::Scope::Base,
        Scope::OneLevel => ldap3::Scope::OneLevel,
        Scope::Subtree => ldap3::Scope::Subtree,
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn bind(&self, params: &ConnectionParams) -> DirectoryResult<Box<dyn DirectorySession>> {
        let url = params.url();
        debug!("Connecting to LDAP server: {} (starttls={})", url, params.tls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(self.settings(params), &url)
            .await
            .map_err(|e| DirectoryError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        ldap3::drive!(conn);

        let result = ldap
            .simple_bind(&params.bind_dn, &params.bind_password)
            .await
            .map_err(|e| DirectoryError::Connection(format!("Bind failed: {}", e)))?;

        if result.rc != 0 {
            let _ = ldap.unbind().await;
            return Err(DirectoryError::BindRejected {
                dn: params.bind_dn.clone(),
                rc: result.rc,
                message: result.text,
            });
        }

        Ok(Box::new(LdapSession { ldap }))
    }
}

struct LdapSession {
    ldap: Ldap,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(&mut self, spec: &SearchSpec) -> DirectoryResult<Vec<SearchEntry>> {
        // An empty attribute list asks for all user attributes
        let attrs: Vec<&str> = spec
            .attrs
            .as_ref()
            .map(|attrs| attrs.iter().map(String::as_str).collect())
            .unwrap_or_default();

        debug!(
            "Running LDAP search with filter:{}, dn:{}, scope:{}",
            spec.filter, spec.base_dn, spec.scope
        );

        let (rs, _res) = self
            .ldap
            .search(&spec.base_dn, ldap_scope(spec.scope), &spec.filter, attrs)
            .await
            .map_err(|e| DirectoryError::Search(e.to_string()))?
            .success()
            .map_err(|e| DirectoryError::Search(e.to_string()))?;

        Ok(rs
            .into_iter()
            .map(|result| {
                let entry = RawEntry::construct(result);
                SearchEntry {
                    dn: entry.dn,
                    attrs: entry.attrs,
                }
            })
            .collect())
    }

    async fn unbind(self: Box<Self>) -> DirectoryResult<()> {
        let mut session = self;
        session
            .ldap
            .unbind()
            .await
            .map_err(|e| DirectoryError::Connection(format!("Unbind failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_mapping() {
        assert!(matches!(ldap_scope(Scope::Base), ldap3::Scope::Base));
        assert!(matches!(ldap_scope(Scope::OneLevel), ldap3::Scope::OneLevel));
        assert!(matches!(ldap_scope(Scope::Subtree), ldap3::Scope::Subtree));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let directory = LdapDirectory::with_timeout(Duration::from_secs(2));
        let params = ConnectionParams {
            server: "127.0.0.1".to_string(),
            port: 1,
            tls: false,
            bind_dn: String::new(),
            bind_password: String::new(),
        };

        // Note: nothing listens on port 1, so connect is refused
        let err = directory.bind(&params).await.err().unwrap();
        assert!(matches!(err, DirectoryError::Connection(_)));
        assert!(!err.is_rejection());
    }
}
