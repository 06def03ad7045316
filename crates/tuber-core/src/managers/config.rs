use crate::error::{CoreError, Result};
use crate::models::{Config, Provider};
use crate::storage::Registry;

pub struct ConfigManager<'a> {
    registry: &'a mut Registry,
}

impl<'a> ConfigManager<'a> {
    pub fn new(registry: &'a mut Registry) -> Self {
        Self { registry }
    }

    /// Fails with `NotConfigured` when the provider has no stored configuration.
    pub fn get(&mut self, provider: Provider) -> Result<Config> {
        self.find(provider)?
            .ok_or(CoreError::NotConfigured(provider))
    }

    pub fn find(&mut self, provider: Provider) -> Result<Option<Config>> {
        match self.registry.get::<Config>(&provider.to_string()) {
            Ok(config) => Ok(Some(config)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Stores the configuration, replacing any previous one of the same provider.
    /// Asking before an overwrite is up to the caller.
    pub fn set(&mut self, config: Config) -> Result<Config> {
        log::info!("Storing {} configuration", config.provider);
        self.registry.set(config.clone())?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};
    use tempfile::TempDir;

    use super::*;

    fn data(api_key: &str) -> Map<String, serde_json::Value> {
        let mut data = Map::new();
        data.insert("api_key".to_string(), json!(api_key));
        data
    }

    #[test]
    fn test_get_unconfigured() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::open(dir.path().join("storage.json"));

        assert!(registry.config().find(Provider::Lastfm).unwrap().is_none());
        let error = registry.config().get(Provider::Lastfm).unwrap_err();
        assert!(matches!(error, CoreError::NotConfigured(Provider::Lastfm)));
    }

    #[test]
    fn test_set_overwrites_per_provider() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::open(dir.path().join("storage.json"));

        registry
            .config()
            .set(Config::new(Provider::Lastfm, data("bbbb")))
            .unwrap();
        registry
            .config()
            .set(Config::new(Provider::Lastfm, data("aaaa")))
            .unwrap();

        let config = registry.config().get(Provider::Lastfm).unwrap();
        assert_eq!(config.value("api_key"), Some("aaaa"));
        assert_eq!(registry.document().unwrap().config.len(), 1);
        assert!(registry.config().find(Provider::Youtube).unwrap().is_none());
    }
}
