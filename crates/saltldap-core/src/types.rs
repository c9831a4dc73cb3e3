//! Shared directory and pillar types

use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Search scope
// ============================================================================

/// LDAP search scope
///
/// Accepts the numeric form used by python-ldap configs (`0`, `1`, `2`)
/// as well as names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "ScopeRepr")]
pub enum Scope {
    /// The base entry only
    Base,
    /// Immediate children of the base entry
    OneLevel,
    /// The base entry and everything below it
    #[default]
    Subtree,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Number(i64),
    Name(String),
}

impl TryFrom<ScopeRepr> for Scope {
    type Error = String;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        match repr {
            ScopeRepr::Number(n) => Scope::from_number(n),
            ScopeRepr::Name(name) => name.parse(),
        }
    }
}

impl Scope {
    fn from_number(n: i64) -> Result<Self, String> {
        match n {
            0 => Ok(Scope::Base),
            1 => Ok(Scope::OneLevel),
            2 => Ok(Scope::Subtree),
            other => Err(format!("invalid search scope: {}", other)),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Scope::from_number(n);
        }
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(Scope::Base),
            "one" | "onelevel" => Ok(Scope::OneLevel),
            "sub" | "subtree" => Ok(Scope::Subtree),
            _ => Err(format!("invalid search scope: {}", s)),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Base => "base",
            Scope::OneLevel => "onelevel",
            Scope::Subtree => "subtree",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Ports
// ============================================================================

/// Ports show up both as integers and as quoted strings
#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u16),
    Text(String),
}

impl PortRepr {
    fn into_port(self) -> Result<u16, String> {
        match self {
            PortRepr::Number(port) => Ok(port),
            PortRepr::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("invalid port: {}", text)),
        }
    }
}

/// `deserialize_with` helper for a port that may be quoted
pub fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    PortRepr::deserialize(deserializer)?
        .into_port()
        .map_err(de::Error::custom)
}

/// Optional form of [`deserialize_port`]
pub fn deserialize_optional_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<PortRepr>::deserialize(deserializer)?
        .map(PortRepr::into_port)
        .transpose()
        .map_err(de::Error::custom)
}

// ============================================================================
// Connection and search parameters
// ============================================================================

/// Parameters for a single directory connection
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub server: String,
    pub port: u16,
    /// Upgrade the connection with STARTTLS
    pub tls: bool,
    pub bind_dn: String,
    pub bind_password: String,
}

impl ConnectionParams {
    /// Same server, different credentials
    pub fn rebind_as(&self, bind_dn: &str, bind_password: &str) -> Self {
        Self {
            bind_dn: bind_dn.to_string(),
            bind_password: bind_password.to_string(),
            ..self.clone()
        }
    }

    /// `ldap://server:port`
    pub fn url(&self) -> String {
        format!("ldap://{}:{}", self.server, self.port)
    }

    /// Anonymous binds carry neither DN nor password
    pub fn is_anonymous(&self) -> bool {
        self.bind_dn.is_empty() && self.bind_password.is_empty()
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"***")
            .finish()
    }
}

/// A single search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub base_dn: String,
    pub scope: Scope,
    pub filter: String,
    /// Requested attributes, `None` for all user attributes
    pub attrs: Option<Vec<String>>,
}

/// Entry returned by a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl SearchEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }
}

// ============================================================================
// Pillar data
// ============================================================================

/// Value stored in pillar data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PillarValue {
    /// Unpacked from a `key=value` item
    Scalar(String),
    /// All values of an attribute
    List(Vec<String>),
}

impl From<&str> for PillarValue {
    fn from(s: &str) -> Self {
        PillarValue::Scalar(s.to_string())
    }
}

impl From<Vec<String>> for PillarValue {
    fn from(v: Vec<String>) -> Self {
        PillarValue::List(v)
    }
}

/// Flat pillar mapping handed back to the host
pub type PillarData = BTreeMap<String, PillarValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        scope: Scope,
    }

    #[test]
    fn test_scope_from_number_and_name() {
        let h: Holder = serde_json::from_str(r#"{"scope": 0}"#).unwrap();
        assert_eq!(h.scope, Scope::Base);
        let h: Holder = serde_json::from_str(r#"{"scope": "onelevel"}"#).unwrap();
        assert_eq!(h.scope, Scope::OneLevel);
        let h: Holder = serde_json::from_str(r#"{"scope": "2"}"#).unwrap();
        assert_eq!(h.scope, Scope::Subtree);

        assert!(serde_json::from_str::<Holder>(r#"{"scope": 7}"#).is_err());
        assert!("everything".parse::<Scope>().is_err());
        assert_eq!("SUB".parse::<Scope>().unwrap(), Scope::Subtree);
    }

    #[test]
    fn test_scope_serializes_by_name() {
        assert_eq!(serde_json::to_string(&Scope::OneLevel).unwrap(), "\"onelevel\"");
        assert_eq!(Scope::Subtree.to_string(), "subtree");
    }

    #[derive(Deserialize)]
    struct PortHolder {
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        #[serde(default, deserialize_with = "deserialize_optional_port")]
        alt: Option<u16>,
    }

    #[test]
    fn test_port_accepts_number_and_quoted_text() {
        let h: PortHolder = serde_json::from_str(r#"{"port": 389}"#).unwrap();
        assert_eq!(h.port, 389);
        assert_eq!(h.alt, None);

        let h: PortHolder = serde_json::from_str(r#"{"port": " 636 ", "alt": "3268"}"#).unwrap();
        assert_eq!(h.port, 636);
        assert_eq!(h.alt, Some(3268));

        assert!(serde_json::from_str::<PortHolder>(r#"{"port": "ldap"}"#).is_err());
        assert!(serde_json::from_str::<PortHolder>(r#"{"port": 70000}"#).is_err());
    }

    #[test]
    fn test_connection_params_debug_masks_password() {
        let params = ConnectionParams {
            server: "localhost".to_string(),
            port: 389,
            tls: false,
            bind_dn: "uid=admin".to_string(),
            bind_password: "sssssh".to_string(),
        };

        let debug = format!("{:?}", params);
        assert!(!debug.contains("sssssh"));
        assert_eq!(params.url(), "ldap://localhost:389");

        let user = params.rebind_as("uid=alice", "secret");
        assert_eq!(user.server, "localhost");
        assert_eq!(user.bind_dn, "uid=alice");
        assert!(!user.is_anonymous());
    }

    #[test]
    fn test_pillar_value_serialization() {
        let mut data = PillarData::new();
        data.insert("ntpserver".to_string(), PillarValue::from("ntp.acme.local"));
        data.insert("cn".to_string(), PillarValue::from(vec!["Alice".to_string()]));

        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"cn":["Alice"],"ntpserver":"ntp.acme.local"}"#);
    }
}
