use std::collections::HashMap;

use serde_json::{Map, Value};

/// Stores the "info.props" properties of an object from a graph dump.
///
/// Only the properties used to name and classify nodes get accessors.
/// Non-string values are kept in their JSON text form.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct PropertyStore {
    properties: HashMap<String, String>,
}

macro_rules! define_properties {
    ($($name:ident = $key:literal),* $(,)?) => {
        impl PropertyStore {
            $(
                #[doc = "Get the "]
                #[doc = stringify!($key)]
                #[doc = " property."]
                pub fn $name(&self) -> Option<&String> {
                    self.properties.get($key)
                }

                #[cfg(test)]
                paste::paste! {
                    pub fn [<set_ $name>](&mut self, value: String) {
                        self.properties.insert(String::from($key), value);
                    }
                }
            )*
        }

        // Ensure that all property identifiers match their keys.
        #[cfg(test)]
        mod property_tests {
            #[test]
            fn ident_and_key_match() {
                $(
                    assert_eq!(
                        stringify!($name),
                        $key.replace(&['.', '-'], "_")
                    );
                )*
            }
        }
    }
}

impl From<&Map<String, Value>> for PropertyStore {
    fn from(map: &Map<String, Value>) -> Self {
        let properties = map
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key.clone(), s.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect();
        PropertyStore { properties }
    }
}

define_properties! {
    application_name = "application.name",
    node_name = "node.name",
    node_description = "node.description",
    media_class = "media.class",
}
