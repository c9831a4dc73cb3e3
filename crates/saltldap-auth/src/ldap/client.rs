//! LDAP authenticator
//!
//! Authenticates a username/password pair with the bind-and-search
//! pattern: bind as the service account, find exactly one entry matching
//! the rendered filter, then bind as that entry with the user's password.

use crate::ldap::connection::LdapDirectory;
use crate::ldap::types::*;
use saltldap_core::directory::RC_UNWILLING_TO_PERFORM;
use saltldap_core::{
    AuthConfig, Directory, DirectoryError, Error, JinjaRenderer, Result, SearchSpec,
    TemplateRenderer,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Requests no attributes; only the DN of the match is needed
const NO_ATTRIBUTES: &str = "1.1";

/// LDAP authenticator
pub struct LdapAuthenticator {
    config: AuthConfig,
    directory: Arc<dyn Directory>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl LdapAuthenticator {
    /// Create an authenticator with explicit collaborators
    pub fn new(
        config: AuthConfig,
        directory: Arc<dyn Directory>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            config,
            directory,
            renderer,
        }
    }

    /// Create an authenticator that talks LDAP and renders `{{ username }}` with Jinja
    pub fn with_ldap(config: AuthConfig) -> Self {
        let directory = match config.timeout_seconds {
            Some(secs) => LdapDirectory::with_timeout(Duration::from_secs(secs)),
            None => LdapDirectory::new(),
        };
        Self::new(config, Arc::new(directory), Arc::new(JinjaRenderer::new()))
    }

    /// Authenticate a user with username and password
    ///
    /// Errors are reserved for configuration problems and for failing to
    /// talk to the directory; every refusal is an `Ok` result. An empty
    /// password is refused as `InvalidCredentials` without a user bind.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<LdapAuthResult> {
        let filter = self.render_filter(username)?;

        // Step 1: Bind with service account
        let service = self.config.connection_params();
        let mut session = self
            .directory
            .bind(&service)
            .await
            .map_err(|source| Error::Connection {
                server: service.server.clone(),
                port: service.port,
                bind_dn: service.bind_dn.clone(),
                source,
            })?;

        // Step 2: Search for user
        let spec = SearchSpec {
            base_dn: self.config.base_dn.clone(),
            scope: self.config.scope,
            filter,
            attrs: Some(vec![NO_ATTRIBUTES.to_string()]),
        };

        debug!(
            "Running LDAP user dn search with filter:{}, dn:{}, scope:{}",
            spec.filter, spec.base_dn, spec.scope
        );

        let found = session.search(&spec).await;
        let _ = session.unbind().await;
        let entries = found?;

        let user_dn = match entries.as_slice() {
            [] => {
                warn!("Unable to find user {}", username);
                return Ok(LdapAuthResult::UserNotFound);
            }
            [entry] => entry.dn.clone(),
            many => {
                warn!("Found multiple results for user {}", username);
                return Ok(LdapAuthResult::AmbiguousUser(many.len()));
            }
        };

        // An empty password would turn the user bind into an unauthenticated bind
        if password.is_empty() {
            warn!("Refusing empty password for user dn: {}", user_dn);
            return Ok(LdapAuthResult::InvalidCredentials);
        }

        // Step 3: Verify user password by binding as the user
        debug!("Attempting LDAP bind with user dn: {}", user_dn);

        let user = service.rebind_as(&user_dn, password);
        match self.directory.bind(&user).await {
            Ok(session) => {
                let _ = session.unbind().await;
                debug!("Successfully authenticated user dn via LDAP: {}", user_dn);
                Ok(LdapAuthResult::Success { dn: user_dn })
            }
            Err(DirectoryError::BindRejected { rc, .. }) => {
                warn!(
                    "Failed to authenticate user dn via LDAP: {} (rc={})",
                    user_dn, rc
                );
                if rc == RC_UNWILLING_TO_PERFORM {
                    Ok(LdapAuthResult::AccountDisabled)
                } else {
                    Ok(LdapAuthResult::InvalidCredentials)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Boolean form of [`authenticate`](Self::authenticate); any error is a refusal
    pub async fn verify(&self, username: &str, password: &str) -> bool {
        match self.authenticate(username, password).await {
            Ok(result) => result.is_success(),
            Err(e) => {
                warn!("LDAP authentication for {} failed: {}", username, e);
                false
            }
        }
    }

    /// Render the configured filter with the escaped username
    fn render_filter(&self, username: &str) -> Result<String> {
        let context = json!({ "username": escape_filter_value(username) });
        Ok(self.renderer.render(&self.config.filter, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use saltldap_core::testing::MemoryDirectory;
    use saltldap_core::{ConnectionParams, DirectoryResult, DirectorySession, SearchEntry};

    const SERVICE_DN: &str = "uid=admin,o=acme,c=gb";
    const ALICE_DN: &str = "uid=alice,ou=people,o=acme,c=gb";

    fn config() -> AuthConfig {
        AuthConfig {
            base_dn: "o=acme,c=gb".to_string(),
            bind_dn: SERVICE_DN.to_string(),
            bind_password: "sssssh".to_string(),
            filter: "emailAddress={{username}}".to_string(),
            ..Default::default()
        }
    }

    fn authenticator(directory: &MemoryDirectory) -> LdapAuthenticator {
        LdapAuthenticator::new(
            config(),
            Arc::new(directory.clone()),
            Arc::new(JinjaRenderer::new()),
        )
    }

    fn directory_with_alice() -> MemoryDirectory {
        MemoryDirectory::new()
            .with_account(SERVICE_DN, "sssssh")
            .with_account(ALICE_DN, "secret")
            .with_result("emailAddress=alice@x.com", vec![SearchEntry::new(ALICE_DN)])
    }

    #[tokio::test]
    async fn test_single_match_and_good_password() {
        let directory = directory_with_alice();
        let auth = authenticator(&directory);

        let result = auth.authenticate("alice@x.com", "secret").await.unwrap();
        assert_eq!(
            result,
            LdapAuthResult::Success {
                dn: ALICE_DN.to_string()
            }
        );
        assert!(auth.verify("alice@x.com", "secret").await);

        let binds = directory.binds();
        assert_eq!(binds[0].bind_dn, SERVICE_DN);
        assert_eq!(binds[1].bind_dn, ALICE_DN);
        assert_eq!(binds[1].bind_password, "secret");

        let search = &directory.searches()[0];
        assert_eq!(search.base_dn, "o=acme,c=gb");
        assert_eq!(search.filter, "emailAddress=alice@x.com");
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let directory = directory_with_alice();
        let auth = authenticator(&directory);

        let result = auth.authenticate("alice@x.com", "wrong").await.unwrap();
        assert_eq!(result, LdapAuthResult::InvalidCredentials);
        assert!(!auth.verify("alice@x.com", "wrong").await);
    }

    #[tokio::test]
    async fn test_no_match_skips_user_bind() {
        let directory = directory_with_alice();
        let auth = authenticator(&directory);

        let result = auth.authenticate("bob@x.com", "secret").await.unwrap();
        assert_eq!(result, LdapAuthResult::UserNotFound);
        assert_eq!(directory.binds().len(), 1);
    }

    #[tokio::test]
    async fn test_multiple_matches_skip_user_bind() {
        let directory = MemoryDirectory::new()
            .with_account(SERVICE_DN, "sssssh")
            .with_account(ALICE_DN, "secret")
            .with_result(
                "emailAddress=alice@x.com",
                vec![
                    SearchEntry::new(ALICE_DN),
                    SearchEntry::new("uid=alice2,ou=people,o=acme,c=gb"),
                ],
            );
        let auth = authenticator(&directory);

        let result = auth.authenticate("alice@x.com", "secret").await.unwrap();
        assert_eq!(result, LdapAuthResult::AmbiguousUser(2));
        assert_eq!(directory.binds().len(), 1);
    }

    #[tokio::test]
    async fn test_service_bind_failure_is_error() {
        let directory = MemoryDirectory::new().with_account(SERVICE_DN, "other");
        let auth = authenticator(&directory);

        let err = auth.authenticate("alice@x.com", "secret").await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
        assert!(!err.to_string().contains("sssssh"));
        assert!(!auth.verify("alice@x.com", "secret").await);
    }

    #[tokio::test]
    async fn test_disabled_account() {
        let directory = directory_with_alice().with_rejected_account(ALICE_DN, 53);
        let auth = authenticator(&directory);

        let result = auth.authenticate("alice@x.com", "secret").await.unwrap();
        assert_eq!(result, LdapAuthResult::AccountDisabled);
    }

    #[tokio::test]
    async fn test_empty_password_refused_without_bind() {
        let directory = directory_with_alice();
        let auth = authenticator(&directory);

        let result = auth.authenticate("alice@x.com", "").await.unwrap();
        assert_eq!(result, LdapAuthResult::InvalidCredentials);
        assert_eq!(directory.binds().len(), 1);
    }

    #[tokio::test]
    async fn test_username_is_escaped() {
        let directory = directory_with_alice();
        let auth = authenticator(&directory);

        let result = auth.authenticate("*", "secret").await.unwrap();
        assert_eq!(result, LdapAuthResult::UserNotFound);
        assert_eq!(directory.searches()[0].filter, "emailAddress=\\2a");
    }

    #[tokio::test]
    async fn test_search_failure_is_error() {
        let directory = MemoryDirectory::new()
            .with_account(SERVICE_DN, "sssssh")
            .with_failing_search("emailAddress=alice@x.com", "size limit exceeded");
        let auth = authenticator(&directory);

        let err = auth.authenticate("alice@x.com", "secret").await.unwrap_err();
        assert!(matches!(err, Error::Directory(DirectoryError::Search(_))));
    }

    /// Lets the service bind through and drops the connection on the user bind
    struct ResetOnUserBind {
        inner: MemoryDirectory,
        user_dn: String,
    }

    #[async_trait]
    impl Directory for ResetOnUserBind {
        async fn bind(
            &self,
            params: &ConnectionParams,
        ) -> DirectoryResult<Box<dyn DirectorySession>> {
            if params.bind_dn == self.user_dn {
                return Err(DirectoryError::Connection("reset".to_string()));
            }
            self.inner.bind(params).await
        }
    }

    #[tokio::test]
    async fn test_user_bind_transport_failure_is_error() {
        let directory = ResetOnUserBind {
            inner: directory_with_alice(),
            user_dn: ALICE_DN.to_string(),
        };
        let auth = LdapAuthenticator::new(
            config(),
            Arc::new(directory),
            Arc::new(JinjaRenderer::new()),
        );

        let err = auth.authenticate("alice@x.com", "secret").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Directory(DirectoryError::Connection(ref msg)) if msg == "reset"
        ));
        assert!(!auth.verify("alice@x.com", "secret").await);
    }
}
