//! Pillar config file
//!
//! After template rendering the file is YAML of the shape:
//! ```yaml
//! search_order:
//!   - ntp
//!   - groups
//! ntp:
//!   server: ldap.acme.local
//!   port: 389
//!   tls: true
//!   binddn: uid=admin,o=acme,c=gb
//!   bindpw: sssssh
//!   dn: ou=hosts,o=acme,c=gb
//!   scope: 2
//!   filter: "(cn={{ id }})"
//!   attrs:
//!     - saltKeyValue
//! ```

use saltldap_core::types::deserialize_optional_port;
use saltldap_core::{ConnectionParams, Scope, SearchSpec, DEFAULT_PORT, DEFAULT_SERVER};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{PillarError, PillarResult};

/// Parsed pillar config
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PillarConfig {
    /// Source names, searched in this order
    #[serde(default)]
    pub search_order: Vec<String>,

    /// Everything else, keyed by source name
    #[serde(flatten)]
    pub sources: BTreeMap<String, serde_yaml::Value>,
}

impl PillarConfig {
    /// Parse rendered config text; blank text is an empty config
    pub fn parse(text: &str) -> PillarResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str::<Option<Self>>(text)?.unwrap_or_default())
    }

    /// Search definition for `name`, `None` when the config has none
    pub fn definition(&self, name: &str) -> Option<PillarResult<SearchDefinition>> {
        self.sources.get(name).map(|value| {
            serde_yaml::from_value(value.clone()).map_err(|e| PillarError::InvalidSource {
                source_name: name.to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// One named search
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchDefinition {
    pub server: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_port")]
    pub port: Option<u16>,

    pub tls: Option<bool>,

    #[serde(alias = "bind_dn")]
    pub binddn: Option<String>,

    #[serde(alias = "bind_password")]
    pub bindpw: Option<String>,

    pub filter: Option<String>,

    /// Search base
    pub dn: Option<String>,

    pub scope: Option<Scope>,

    /// Requested attributes; also the attributes unpacked as `key=value`
    pub attrs: Option<Vec<String>>,
}

impl SearchDefinition {
    /// Connection and search parameters with defaults applied
    pub fn to_request(&self, source_name: &str) -> PillarResult<(ConnectionParams, SearchSpec)> {
        let filter = self.filter.clone().ok_or_else(|| PillarError::MissingFilter {
            source_name: source_name.to_string(),
        })?;

        let params = ConnectionParams {
            server: self
                .server
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            tls: self.tls.unwrap_or(false),
            bind_dn: self.binddn.clone().unwrap_or_default(),
            bind_password: self.bindpw.clone().unwrap_or_default(),
        };

        let spec = SearchSpec {
            base_dn: self.dn.clone().unwrap_or_default(),
            scope: self.scope.unwrap_or_default(),
            filter,
            attrs: self.attrs.clone(),
        };

        Ok((params, spec))
    }

    /// Attributes whose values are unpacked as `key=value`
    pub fn composite_attrs(&self) -> &[String] {
        self.attrs.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
search_order:
  - ntp
  - groups
ntp:
  server: ldap.acme.local
  port: "636"
  tls: true
  binddn: uid=admin,o=acme,c=gb
  bindpw: sssssh
  filter: "(cn=host1)"
  dn: ou=hosts,o=acme
  scope: 1
  attrs:
    - saltKeyValue
groups:
  filter: "(memberUid=host1)"
"#;

    #[test]
    fn test_parse_full_definition() {
        let config = PillarConfig::parse(CONFIG).unwrap();
        assert_eq!(config.search_order, vec!["ntp", "groups"]);

        let ntp = config.definition("ntp").unwrap().unwrap();
        let (params, spec) = ntp.to_request("ntp").unwrap();
        assert_eq!(params.server, "ldap.acme.local");
        assert_eq!(params.port, 636);
        assert!(params.tls);
        assert_eq!(params.bind_dn, "uid=admin,o=acme,c=gb");
        assert_eq!(params.bind_password, "sssssh");
        assert_eq!(spec.base_dn, "ou=hosts,o=acme");
        assert_eq!(spec.scope, Scope::OneLevel);
        assert_eq!(spec.filter, "(cn=host1)");
        assert_eq!(spec.attrs, Some(vec!["saltKeyValue".to_string()]));
        assert_eq!(ntp.composite_attrs(), ["saltKeyValue".to_string()]);
    }

    #[test]
    fn test_defaults_applied() {
        let config = PillarConfig::parse(CONFIG).unwrap();
        let groups = config.definition("groups").unwrap().unwrap();
        let (params, spec) = groups.to_request("groups").unwrap();

        assert_eq!(params.server, "localhost");
        assert_eq!(params.port, 389);
        assert!(!params.tls);
        assert!(params.is_anonymous());
        assert_eq!(spec.base_dn, "");
        assert_eq!(spec.scope, Scope::Subtree);
        assert_eq!(spec.attrs, None);
        assert!(groups.composite_attrs().is_empty());
    }

    #[test]
    fn test_missing_filter() {
        let def = SearchDefinition {
            dn: Some("o=acme".to_string()),
            ..Default::default()
        };

        let err = def.to_request("ntp").unwrap_err();
        assert!(matches!(err, PillarError::MissingFilter { ref source_name } if source_name == "ntp"));
    }

    #[test]
    fn test_missing_and_invalid_sources() {
        let config = PillarConfig::parse("search_order: [a, b]\nb:\n  port: nope\n").unwrap();
        assert!(config.definition("a").is_none());
        assert!(matches!(
            config.definition("b"),
            Some(Err(PillarError::InvalidSource { .. }))
        ));
    }

    #[test]
    fn test_blank_and_null_documents() {
        assert!(PillarConfig::parse("").unwrap().search_order.is_empty());
        assert!(PillarConfig::parse("   \n").unwrap().search_order.is_empty());
        assert!(PillarConfig::parse("~").unwrap().search_order.is_empty());
        assert!(PillarConfig::parse("- not\n- a map\n").is_err());
    }
}
