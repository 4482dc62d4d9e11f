//! Configuration for MAAS clients.
//!
//! [`MaasClientConfig`] is a plain, serializable description of how to reach a
//! MAAS region controller. It is validated on construction and never reads the
//! environment; loading it from a file or CLI is left to the application.

use crate::client::{ClientConfig, RetryPolicy, DEFAULT_API_VERSION, MAAS_DEFAULT_TIMEOUT};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Configuration for a MAAS client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MaasClientConfig {
    /// Region controller base URL, e.g. `http://maas.example.com:5240/MAAS`
    #[validate(url)]
    pub base_url: String,

    /// API key in `consumer_key:token_key:token_secret` form.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API version segment of request paths
    #[validate(length(min = 1))]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of retry attempts for connection failures
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    MAAS_DEFAULT_TIMEOUT
}

const fn default_max_retries() -> u32 {
    3
}

impl MaasClientConfig {
    /// Create a new client configuration for the given region controller.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            ..Self::default()
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set the API key for authentication.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid MAAS URL: {e}")))
    }

    /// HTTP tuning derived from this configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(self.timeout())
            .with_tls_verify(self.tls_verify)
            .with_retry_policy(RetryPolicy::new().with_max_retries(self.max_retries))
    }
}

impl Default for MaasClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5240/MAAS".to_string(),
            api_key: None,
            api_version: default_api_version(),
            tls_verify: default_tls_verify(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}
