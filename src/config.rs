//! Configuration types for prefix lookup runs

use crate::asn::cache::DEFAULT_CACHE_SIZE;
use crate::asn::rdap::DEFAULT_RDAP_BASE_URL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of lookups in flight at once
pub const DEFAULT_WORKERS: usize = 10;

/// Default per-prefix lookup timeout in milliseconds
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5000;

/// Configuration for a lookup run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Maximum concurrent lookups (default: 10)
    pub workers: usize,
    /// Maximum cached prefixes (default: 1000)
    pub cache_size: usize,
    /// Timeout for a single prefix lookup (default: 5000ms)
    pub lookup_timeout: Duration,
    /// Base URL of the RDAP service (default: https://rdap.org)
    pub rdap_base_url: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            cache_size: DEFAULT_CACHE_SIZE,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            rdap_base_url: DEFAULT_RDAP_BASE_URL.to_string(),
        }
    }
}

impl LookupConfig {
    /// Create a new LookupConfig builder
    pub fn builder() -> LookupConfigBuilder {
        LookupConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers < 1 {
            return Err("workers must be at least 1".to_string());
        }
        if self.cache_size < 1 {
            return Err("cache_size must be at least 1".to_string());
        }
        if self.lookup_timeout.as_millis() == 0 {
            return Err("lookup_timeout must be greater than 0".to_string());
        }
        if !(self.rdap_base_url.starts_with("http://") || self.rdap_base_url.starts_with("https://"))
        {
            return Err(format!(
                "rdap_base_url must be an http(s) URL, got '{}'",
                self.rdap_base_url
            ));
        }
        Ok(())
    }
}

/// Builder for LookupConfig
pub struct LookupConfigBuilder {
    config: LookupConfig,
}

impl LookupConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LookupConfig::default(),
        }
    }

    /// Set the number of concurrent lookups
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the maximum number of cached prefixes
    pub fn cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = size;
        self
    }

    /// Set the per-prefix lookup timeout
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.config.lookup_timeout = timeout;
        self
    }

    /// Set the RDAP service base URL
    pub fn rdap_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.rdap_base_url = url.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<LookupConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for LookupConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LookupConfig::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.cache_size, 1000);
        assert_eq!(config.lookup_timeout.as_millis(), 5000);
        assert_eq!(config.rdap_base_url, "https://rdap.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = LookupConfig::builder()
            .workers(32)
            .cache_size(50)
            .lookup_timeout(Duration::from_millis(750))
            .rdap_base_url("https://rdap.arin.net/registry")
            .build()
            .unwrap();

        assert_eq!(config.workers, 32);
        assert_eq!(config.cache_size, 50);
        assert_eq!(config.lookup_timeout.as_millis(), 750);
        assert_eq!(config.rdap_base_url, "https://rdap.arin.net/registry");
    }

    #[test]
    fn test_config_validation() {
        // Zero workers
        let result = LookupConfig::builder().workers(0).build();
        assert!(result.is_err());

        // Zero cache size
        let result = LookupConfig::builder().cache_size(0).build();
        assert!(result.is_err());

        // Zero timeout
        let result = LookupConfig::builder()
            .lookup_timeout(Duration::from_millis(0))
            .build();
        assert!(result.is_err());

        // Not a URL
        let result = LookupConfig::builder().rdap_base_url("rdap.org").build();
        assert!(result.unwrap_err().contains("rdap.org"));
    }
}
