//! Authentication results and filter helpers

// ============================================================================
// Authentication Result
// ============================================================================

/// LDAP authentication result
///
/// Transport failures are not results; they come back as errors so the
/// caller can decide whether to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdapAuthResult {
    /// User bind succeeded
    Success { dn: String },
    /// Filter matched no entry
    UserNotFound,
    /// Filter matched more than one entry
    AmbiguousUser(usize),
    /// Server rejected the user's password
    InvalidCredentials,
    /// Account disabled/locked
    AccountDisabled,
}

impl LdapAuthResult {
    pub fn is_success(&self) -> bool {
        matches!(self, LdapAuthResult::Success { .. })
    }

    pub fn dn(&self) -> Option<&str> {
        match self {
            LdapAuthResult::Success { dn } => Some(dn),
            _ => None,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape a value for use inside a search filter (RFC 4515)
pub fn escape_filter_value(value: &str) -> String {
    ldap3::ldap_escape(value).into_owned()
}
