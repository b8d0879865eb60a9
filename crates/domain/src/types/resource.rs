//! Resource descriptor attached to configuration requests

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Label set identifying the instrumented process to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

impl Resource {
    pub fn new<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(key, value)| KeyValue { key: key.into(), value: value.into() })
            .collect();
        Self { attributes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|kv| kv.key == key).map(|kv| kv.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl From<&BTreeMap<String, String>> for Resource {
    fn from(map: &BTreeMap<String, String>) -> Self {
        Self::new(map.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}
