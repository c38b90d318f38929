//! Civo REST API client
//!
//! Thin bearer-token JSON client. Every request is scoped to a region:
//! GET/DELETE send it as a `region` query parameter, POST/PUT add it to the
//! JSON body. Rate limits and server errors are retried with backoff.

use crate::error::{CivoError, Result};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use stratoflow_cloud::RetryConfig;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.civo.com";
pub const DEFAULT_REGION: &str = "LON1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`CivoClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API token; requests fail with [`CivoError::MissingToken`] without one
    pub token: Option<String>,
    pub region: String,
    pub api_url: String,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: None,
            region: DEFAULT_REGION.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CivoClient {
    http: reqwest::Client,
    token: Option<String>,
    region: String,
    base_url: String,
    retry: RetryConfig,
}

/// Error body returned by the API
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ErrorBody {
    code: String,
    reason: String,
}

impl CivoClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stratoflow/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            token: config.token.filter(|t| !t.is_empty()),
            region: config.region,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            retry: config.retry,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Same client scoped to another region
    pub fn in_region(&self, region: Option<&str>) -> CivoClient {
        match region {
            Some(region) if !region.is_empty() && region != self.region => CivoClient {
                region: region.to_string(),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_query(path, &[]).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let text = self.send(Method::GET, path, query, None).await?;
        decode(&text)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let text = self
            .send(Method::POST, path, &[], Some(serde_json::to_value(body)?))
            .await?;
        decode(&text)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let text = self
            .send(Method::PUT, path, &[], Some(serde_json::to_value(body)?))
            .await?;
        decode(&text)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<String> {
        let token = self.token.as_deref().ok_or(CivoError::MissingToken)?;
        let url = format!("{}/v2/{}", self.base_url, path.trim_start_matches('/'));
        let body = body.map(|b| self.with_region(b));
        let mut attempt = 0u32;

        loop {
            let mut request = self.http.request(method.clone(), &url).bearer_auth(token);
            if body.is_none() {
                request = request.query(&[("region", self.region.as_str())]);
            }
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            debug!("{} {} (region {})", method, url, self.region);
            let outcome = request.send().await;

            let retryable = match &outcome {
                Ok(response) => {
                    response.status() == StatusCode::TOO_MANY_REQUESTS
                        || response.status().is_server_error()
                }
                Err(e) => e.is_connect() || e.is_timeout(),
            };

            if retryable && attempt < self.retry.max_attempts {
                let delay = self.retry.delay_for_attempt(attempt);
                match &outcome {
                    Ok(response) => warn!(
                        "{} {} returned {}, retrying in {:?}",
                        method,
                        url,
                        response.status(),
                        delay
                    ),
                    Err(e) => warn!("{} {} failed ({}), retrying in {:?}", method, url, e, delay),
                }
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let response = outcome?;
            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                return Ok(text);
            }
            return Err(api_error(status, &text, path));
        }
    }

    fn with_region(&self, body: Value) -> Value {
        match body {
            Value::Object(mut map) => {
                map.entry("region")
                    .or_insert_with(|| Value::String(self.region.clone()));
                Value::Object(map)
            }
            other => other,
        }
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    if text.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(text)?)
}

fn api_error(status: StatusCode, text: &str, path: &str) -> CivoError {
    let body: ErrorBody = serde_json::from_str(text).unwrap_or_default();
    let reason = if body.reason.is_empty() {
        text.trim().to_string()
    } else {
        body.reason
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return CivoError::Unauthorized(reason);
    }
    if status == StatusCode::NOT_FOUND || body.code.ends_with("_not_found") {
        return CivoError::NotFound(format!("{} ({})", path, reason));
    }

    CivoError::Api {
        status: status.as_u16(),
        code: body.code,
        reason,
    }
}
