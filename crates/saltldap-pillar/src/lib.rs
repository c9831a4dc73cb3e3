//! LDAP external pillar
//!
//! Parses a templated YAML config describing an ordered list of LDAP
//! searches, runs them, and merges the flattened results in order with
//! later searches overriding earlier ones.

pub mod config;
pub mod error;
pub mod flatten;
pub mod source;

pub use config::{PillarConfig, SearchDefinition};
pub use error::{PillarError, PillarResult};
pub use flatten::flatten_entry;
pub use source::LdapPillar;
