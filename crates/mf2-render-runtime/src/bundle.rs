use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};

/// Message patterns for a single locale, keyed by message id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    locale: String,
    messages: BTreeMap<String, String>,
}

impl Bundle {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            messages: BTreeMap::new(),
        }
    }

    pub fn with_message(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.add_message(key, pattern);
        self
    }

    pub fn add_message(&mut self, key: impl Into<String>, pattern: impl Into<String>) {
        self.messages.insert(key.into(), pattern.into());
    }

    /// Adds every entry; later keys replace earlier ones.
    pub fn add_resource<I, K, V>(&mut self, resource: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, pattern) in resource {
            self.add_message(key, pattern);
        }
    }

    /// Adds the string members of a JSON object and returns how many were taken.
    /// Members holding any other JSON type are skipped.
    pub fn add_json_resource(&mut self, resource: &serde_json::Value) -> RuntimeResult<usize> {
        let object = resource
            .as_object()
            .ok_or_else(|| RuntimeError::InvalidBundle(self.locale.clone()))?;
        let mut added = 0;
        for (key, value) in object {
            match value.as_str() {
                Some(pattern) => {
                    self.add_message(key.as_str(), pattern);
                    added += 1;
                }
                None => debug!("skipping non-string message '{key}' in {} bundle", self.locale),
            }
        }
        Ok(added)
    }

    pub fn from_json_str(locale: impl Into<String>, contents: &str) -> RuntimeResult<Self> {
        let mut bundle = Self::new(locale);
        let resource: serde_json::Value = serde_json::from_str(contents)?;
        bundle.add_json_resource(&resource)?;
        Ok(bundle)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn get_message(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn has_message(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
