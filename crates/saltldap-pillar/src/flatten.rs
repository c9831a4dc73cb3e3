//! Search result to pillar mapping
//!
//! Attributes named in the source's `attrs` list are composite: each
//! value of the form `key=value` becomes its own top-level pillar key.
//! For example the search result
//!
//! ```text
//! saltKeyValue: ["ntpserver=ntp.acme.local", "foo=myfoo"]
//! ```
//!
//! becomes `{ntpserver: "ntp.acme.local", foo: "myfoo"}`. Every other
//! attribute is stored under its own name with its list of values.

use saltldap_core::{PillarData, PillarValue};
use std::collections::HashMap;

/// Flatten one entry's attributes into pillar data
pub fn flatten_entry(attrs: &HashMap<String, Vec<String>>, composite: &[String]) -> PillarData {
    let mut result = PillarData::new();

    // Sorted so overlapping keys resolve the same way on every run
    let mut names: Vec<&String> = attrs.keys().collect();
    names.sort();

    for name in names {
        let values = &attrs[name];
        let is_composite = composite.iter().any(|c| c.eq_ignore_ascii_case(name));

        if !is_composite {
            result.insert(name.clone(), PillarValue::List(values.clone()));
            continue;
        }

        for item in values {
            match item.split_once('=') {
                Some((key, value)) => {
                    result.insert(key.to_string(), PillarValue::Scalar(value.to_string()));
                }
                None => {
                    result.insert(name.clone(), PillarValue::List(values.clone()));
                }
            }
        }
    }

    result
}
