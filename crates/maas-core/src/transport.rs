//! Transport contract and its reqwest implementation.
//!
//! Everything above this module talks to the region controller only through
//! [`ControllerInterface`]: a verb, a path, an optional `op` name and a set of
//! form parameters in, raw bytes or an [`Error::Server`] out. [`HttpController`]
//! is the production implementation; tests substitute `MockControllerInterface`.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

use crate::client::{ClientConfig, RetryPolicy, DEFAULT_API_VERSION};
use crate::config::MaasClientConfig;
use crate::error::{Error, Result, ServerError};
use crate::query::QueryParams;

/// Minimal HTTP contract consumed by the MAAS operations.
///
/// Relative paths are resolved under the versioned API root; paths starting
/// with `/` are resource URIs returned by the server and are resolved against
/// its origin. A non-2xx response is always reported as [`Error::Server`].
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ControllerInterface: Send + Sync {
    /// `GET path?op=<op>` with `params` in the query string.
    async fn get(&self, path: &str, op: &str, params: &QueryParams) -> Result<Vec<u8>>;

    /// `POST path?op=<op>` with `params` as an urlencoded form.
    async fn post(&self, path: &str, op: &str, params: &QueryParams) -> Result<Vec<u8>>;

    /// `POST path?op=<op>` as multipart, with `file` in a `file` part.
    async fn post_file(
        &self,
        path: &str,
        op: &str,
        params: &QueryParams,
        file: Vec<u8>,
    ) -> Result<Vec<u8>>;

    /// `PUT path` with `params` as an urlencoded form.
    async fn put(&self, path: &str, params: &QueryParams) -> Result<Vec<u8>>;

    /// `DELETE path`.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Capabilities advertised by the server's `version/` endpoint.
    async fn api_version_info(&self) -> Result<BTreeSet<String>>;
}

/// OAuth 1.0 PLAINTEXT credentials parsed from a MAAS API key.
#[derive(Clone)]
struct Credentials {
    consumer_key: String,
    token_key: String,
    token_secret: SecretString,
}

impl Credentials {
    fn parse(api_key: &str) -> Result<Self> {
        let parts: Vec<&str> = api_key.split(':').collect();
        match parts.as_slice() {
            [consumer, token, secret] => Ok(Self {
                consumer_key: (*consumer).to_string(),
                token_key: (*token).to_string(),
                token_secret: SecretString::from((*secret).to_string()),
            }),
            _ => Err(Error::ConfigError(format!(
                "invalid API key: expected 3 colon-separated parts, got {}",
                parts.len()
            ))),
        }
    }

    fn authorization(&self) -> String {
        let nonce = uuid::Uuid::new_v4();
        let timestamp = chrono::Utc::now().timestamp();
        let secret: String =
            url::form_urlencoded::byte_serialize(self.token_secret.expose_secret().as_bytes())
                .collect();
        format!(
            "OAuth oauth_version=\"1.0\", oauth_signature_method=\"PLAINTEXT\", \
             oauth_consumer_key=\"{}\", oauth_token=\"{}\", oauth_signature=\"&{secret}\", \
             oauth_nonce=\"{nonce}\", oauth_timestamp=\"{timestamp}\"",
            self.consumer_key, self.token_key
        )
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("token_key", &self.token_key)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpController`].
#[derive(Debug, Clone)]
pub struct HttpControllerBuilder {
    base_url: Url,
    api_version: String,
    api_key: Option<String>,
    http_config: ClientConfig,
}

impl HttpControllerBuilder {
    /// Create a new builder for the region controller at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(|err| {
            Error::ConfigError(format!(
                "Invalid MAAS base URL `{}`: {err}",
                base_url.as_ref()
            ))
        })?;

        Ok(Self {
            base_url: url,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            http_config: ClientConfig::new(),
        })
    }

    /// Create a builder from a validated [`MaasClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the base URL cannot be parsed.
    pub fn from_config(config: &MaasClientConfig) -> Result<Self> {
        let mut builder = Self::new(&config.base_url)?
            .with_api_version(config.api_version.clone())
            .with_http_config(config.client_config());
        builder.api_key.clone_from(&config.api_key);
        Ok(builder)
    }

    /// Authenticate with a `consumer_key:token_key:token_secret` API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the API version (default `2.0`).
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry;
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for a malformed API key or HTTP setup failure.
    pub fn build(self) -> Result<HttpController> {
        let credentials = self.api_key.as_deref().map(Credentials::parse).transpose()?;
        let http = self.http_config.build_http_client()?;

        let mut base = self.base_url;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let api_root = base.join(&format!("api/{}/", self.api_version))?;

        Ok(HttpController {
            http,
            api_root,
            credentials,
            retry_policy: self.http_config.retry_policy,
        })
    }
}

/// Request payload variants sent by [`HttpController`].
enum Payload<'a> {
    Query(&'a QueryParams),
    Form(&'a QueryParams),
    Multipart(&'a QueryParams, &'a [u8]),
    Empty,
}

/// reqwest-backed [`ControllerInterface`] with OAuth PLAINTEXT signing.
#[derive(Debug, Clone)]
pub struct HttpController {
    http: Client,
    api_root: Url,
    credentials: Option<Credentials>,
    retry_policy: RetryPolicy,
}

impl HttpController {
    /// Construct an anonymous controller with default settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the URL cannot be parsed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        HttpControllerBuilder::new(base_url)?.build()
    }

    /// Versioned API root, e.g. `http://maas:5240/MAAS/api/2.0/`.
    #[must_use]
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Resolve `path` to a full URL, always with a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEndpoint` if the path cannot be joined.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let mut path = path.to_string();
        if !path.ends_with('/') {
            path.push('/');
        }
        self.api_root
            .join(&path)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid MAAS path `{path}`: {err}")))
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        op: &str,
        payload: Payload<'_>,
    ) -> Result<Vec<u8>> {
        let url = self.resolve(path)?;
        let mut attempt = 0;

        loop {
            let mut request = self.http.request(method.clone(), url.clone());
            if !op.is_empty() {
                request = request.query(&[("op", op)]);
            }
            request = match &payload {
                Payload::Query(params) => request.query(params.pairs()),
                Payload::Form(params) => request.form(params.pairs()),
                Payload::Multipart(params, file) => request.multipart(multipart(params, file)),
                Payload::Empty => request,
            };
            if let Some(credentials) = &self.credentials {
                request = request.header(reqwest::header::AUTHORIZATION, credentials.authorization());
            }
            request = request.header(reqwest::header::ACCEPT, "application/json");

            info!(%method, path, op, attempt, "MAAS request");

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let bytes = response.bytes().await.map_err(|err| {
                        Error::HttpError(format!("Failed to read MAAS response body: {err}"))
                    })?;

                    if status.is_success() {
                        return Ok(bytes.to_vec());
                    }
                    let body = String::from_utf8_lossy(&bytes).into_owned();
                    return Err(ServerError::new(status, body).into());
                }
                Err(err) => {
                    if !self.retry_policy.should_retry(attempt, &method, &err) {
                        return Err(err.into());
                    }
                }
            }

            attempt += 1;
            let delay = self.retry_policy.delay_for_attempt(attempt);
            if delay > Duration::from_millis(0) {
                debug!("Retrying MAAS request after {:?}", delay);
                sleep(delay).await;
            }
        }
    }
}

fn multipart(params: &QueryParams, file: &[u8]) -> Form {
    let file_name = params.get("filename").unwrap_or("file").to_string();
    params
        .pairs()
        .iter()
        .fold(Form::new(), |form, (name, value)| {
            form.text(name.clone(), value.clone())
        })
        .part("file", Part::bytes(file.to_vec()).file_name(file_name))
}

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(default)]
    capabilities: Vec<String>,
}

#[async_trait]
impl ControllerInterface for HttpController {
    async fn get(&self, path: &str, op: &str, params: &QueryParams) -> Result<Vec<u8>> {
        self.dispatch(Method::GET, path, op, Payload::Query(params))
            .await
    }

    async fn post(&self, path: &str, op: &str, params: &QueryParams) -> Result<Vec<u8>> {
        self.dispatch(Method::POST, path, op, Payload::Form(params))
            .await
    }

    async fn post_file(
        &self,
        path: &str,
        op: &str,
        params: &QueryParams,
        file: Vec<u8>,
    ) -> Result<Vec<u8>> {
        self.dispatch(Method::POST, path, op, Payload::Multipart(params, &file))
            .await
    }

    async fn put(&self, path: &str, params: &QueryParams) -> Result<Vec<u8>> {
        self.dispatch(Method::PUT, path, "", Payload::Form(params))
            .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.dispatch(Method::DELETE, path, "", Payload::Empty)
            .await
            .map(|_| ())
    }

    async fn api_version_info(&self) -> Result<BTreeSet<String>> {
        let bytes = self
            .dispatch(Method::GET, "version/", "", Payload::Empty)
            .await?;
        let info: VersionInfo = serde_json::from_slice(&bytes)?;
        Ok(info.capabilities.into_iter().collect())
    }
}
