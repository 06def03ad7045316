use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::storage::Registry;

/// Scratch values remembered between runs to prefill prompts.
pub struct HistoryManager<'a> {
    registry: &'a mut Registry,
}

impl<'a> HistoryManager<'a> {
    pub fn new(registry: &'a mut Registry) -> Self {
        Self { registry }
    }

    /// Returns the remembered value, or `default` when it is missing or has another shape.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str, default: T) -> Result<T> {
        let value = match self.registry.history_value(key)? {
            Some(value) => value,
            None => return Ok(default),
        };
        match serde_json::from_value(value) {
            Ok(value) => Ok(value),
            Err(error) => {
                log::debug!("Ignoring history value for {}: {}", key, error);
                Ok(default)
            }
        }
    }

    pub fn set(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        self.set_all([(key, serde_json::to_value(value)?)])
    }

    pub fn set_all<'k>(&mut self, values: impl IntoIterator<Item = (&'k str, Value)>) -> Result<()> {
        self.registry.set_history_values(
            values
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        )
    }
}
