use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::models::UpstreamPayload;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client for the upstream chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.api_endpoint.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Send `payload` upstream and wait for the response headers.
    ///
    /// Buffered requests get a whole-exchange timeout. Streaming requests are
    /// only bounded until headers arrive; the relay loop bounds each read.
    pub async fn send(&self, api_key: &str, payload: &UpstreamPayload) -> Result<reqwest::Response> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| RelayError::ConfigError(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if payload.stream {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }

        let request = self.http.post(&self.endpoint).headers(headers).json(payload);

        if payload.stream {
            match tokio::time::timeout(self.request_timeout, request.send()).await {
                Ok(response) => Ok(response?),
                Err(_) => Err(RelayError::Timeout(format!(
                    "no response headers within {}s",
                    self.request_timeout.as_secs()
                ))),
            }
        } else {
            Ok(request.timeout(self.request_timeout).send().await?)
        }
    }
}
