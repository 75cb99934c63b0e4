//! TriggerWorks build-metadata infrastructure adapter.
//!
//! Implements the [`triggers::BuildInfoService`] port over HTTP against a
//! build-metadata gateway: a REST service that fronts one or more CI masters
//! and serves build status and published properties by master/job/run.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, URL construction, response
//! decoding, and error mapping live here. The [`triggers`] crate sees only
//! [`triggers::BuildInfoService`] and [`triggers::BuildInfoError`]; `reqwest`
//! types never cross the port boundary.
//!
//! ## Endpoints
//!
//! - `GET {base}/builds/{master}/{job}/info[?buildNumber=N]`: metadata for
//!   one build; the gateway answers with the latest run when `buildNumber`
//!   is omitted.
//! - `GET {base}/builds/{master}/{job}/properties?propertyFile=F[&buildNumber=N]`:
//!   properties the build published to `F`. An absent or empty property
//!   file short-circuits to an empty map without a request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use triggers::{BuildEvent, BuildInfo, BuildInfoError, BuildInfoService, TriggerError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection settings for the build-metadata gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfoConfig {
    /// Base URL of the gateway (e.g. `https://buildinfo.internal:8085`).
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl BuildInfoConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// [`BuildInfoService`] implementation over the gateway's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpBuildInfoClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpBuildInfoClient {
    /// Validates the configuration and constructs the client.
    ///
    /// Fails with [`TriggerError::Configuration`] when the base URL does not
    /// parse or cannot carry path segments; nothing is validated per-request
    /// after this point.
    pub fn new(config: BuildInfoConfig) -> Result<Self, TriggerError> {
        let base_url = Url::parse(&config.base_url).map_err(|error| TriggerError::Configuration {
            message: format!("invalid build info base url `{}`: {error}", config.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TriggerError::Configuration {
                message: format!(
                    "build info base url `{}` cannot carry path segments",
                    config.base_url
                ),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|error| TriggerError::Configuration {
                message: format!("could not construct http client: {error}"),
            })?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Construction rejects cannot-be-a-base URLs, so segments always apply.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn info_url(&self, event: &BuildEvent) -> Url {
        let mut url = self.endpoint(&["builds", event.master(), event.job_name(), "info"]);
        if let Some(number) = event.build_number() {
            url.query_pairs_mut()
                .append_pair("buildNumber", &number.to_string());
        }
        url
    }

    fn properties_url(&self, event: &BuildEvent, property_file: &str) -> Url {
        let mut url = self.endpoint(&["builds", event.master(), event.job_name(), "properties"]);
        url.query_pairs_mut()
            .append_pair("propertyFile", property_file);
        if let Some(number) = event.build_number() {
            url.query_pairs_mut()
                .append_pair("buildNumber", &number.to_string());
        }
        url
    }
}

#[async_trait]
impl BuildInfoService for HttpBuildInfoClient {
    async fn get_build_info(&self, event: &BuildEvent) -> Result<BuildInfo, BuildInfoError> {
        let url = self.info_url(event);
        debug!(%url, master = event.master(), job = event.job_name(), "fetching build info");
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        response.json::<Value>().await.map_err(decode_error)
    }

    async fn get_properties(
        &self,
        event: &BuildEvent,
        property_file: Option<&str>,
    ) -> Result<Map<String, Value>, BuildInfoError> {
        let property_file = match property_file {
            Some(file) if !file.is_empty() => file,
            _ => return Ok(Map::new()),
        };
        let url = self.properties_url(event, property_file);
        debug!(%url, property_file, "fetching build properties");
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        response
            .json::<Map<String, Value>>()
            .await
            .map_err(decode_error)
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn transport_error(error: reqwest::Error) -> BuildInfoError {
    BuildInfoError::Transport {
        message: error.to_string(),
    }
}

fn decode_error(error: reqwest::Error) -> BuildInfoError {
    BuildInfoError::Decode {
        message: error.to_string(),
    }
}

async fn check_status(response: Response) -> Result<Response, BuildInfoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs);
    let message = response.text().await.unwrap_or_default();
    Err(BuildInfoError::Service {
        status: status.as_u16(),
        message,
        retry_after,
    })
}
