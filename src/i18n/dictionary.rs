//! Flat key → display string mapping for one language.

use std::collections::HashMap;

/// Why a payload was rejected as a dictionary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DictionaryError {
    #[error("payload is not valid JSON: {0}")]
    Json(String),

    #[error("payload is not a JSON object (found {0})")]
    NotAnObject(&'static str),

    #[error("value for key {key:?} is not a string (found {found})")]
    NonStringValue { key: String, found: &'static str },
}

/// Translations for one language. Values may contain inline markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationDictionary {
    entries: HashMap<String, String>,
}

impl TranslationDictionary {
    /// Parse a JSON payload that must be an object of string values.
    pub fn from_json(payload: &str) -> Result<Self, DictionaryError> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| DictionaryError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, DictionaryError> {
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => return Err(DictionaryError::NotAnObject(json_kind(&other))),
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (key, value) in map {
            match value {
                serde_json::Value::String(s) => {
                    entries.insert(key, s);
                }
                other => {
                    return Err(DictionaryError::NonStringValue {
                        key,
                        found: json_kind(&other),
                    })
                }
            }
        }
        Ok(Self { entries })
    }

    /// Translation for `key`. Empty strings count as missing.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
