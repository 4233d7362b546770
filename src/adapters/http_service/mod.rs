// HTTP service adapter - Talks to the remote processing service over JSON/HTTP

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::error::{BatchTrimError, BatchTrimResult};
use crate::ports::*;

const SCAN_PATH: &str = "/api/scan";
const PROCESS_PATH: &str = "/api/process";
const STATUS_PATH: &str = "/api/status";

/// reqwest-based adapter for the processing service
pub struct HttpServiceAdapter {
    client: Client,
    base_url: String,
}

impl HttpServiceAdapter {
    /// Create new adapter for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DomainError::ConfigError(
                BatchTrimError::InvalidUrl { url: base_url }.to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create adapter from client settings
    pub fn from_config(config: &ClientConfig) -> Result<Self, DomainError> {
        Self::new(&config.service_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the body, failing on non-success status
    async fn read_body(response: Response) -> BatchTrimResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BatchTrimError::HttpStatus {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> BatchTrimResult<T> {
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_scan(&self, folder_path: &str) -> BatchTrimResult<ScanResult> {
        debug!(folder = %folder_path, "GET {}", SCAN_PATH);
        let response = self
            .client
            .get(self.endpoint(SCAN_PATH))
            .query(&[("path", folder_path)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn post_process(&self, request: &ProcessRequest) -> BatchTrimResult<SubmissionAck> {
        debug!(input = %request.input, output = %request.output, "POST {}", PROCESS_PATH);
        let response = self
            .client
            .post(self.endpoint(PROCESS_PATH))
            .json(request)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        // Any acknowledgment body is accepted; non-JSON text is kept verbatim.
        let acknowledgment = if body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body))
        };
        Ok(SubmissionAck::new(acknowledgment))
    }

    async fn fetch_status(&self) -> BatchTrimResult<ProgressSnapshot> {
        let response = self.client.get(self.endpoint(STATUS_PATH)).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl TrimServicePort for HttpServiceAdapter {
    async fn scan(&self, folder_path: &str) -> Result<ScanResult, DomainError> {
        self.fetch_scan(folder_path)
            .await
            .map_err(|e| e.into_domain(DomainError::ScanFailed))
    }

    async fn submit(&self, request: &ProcessRequest) -> Result<SubmissionAck, DomainError> {
        self.post_process(request)
            .await
            .map_err(|e| e.into_domain(DomainError::SubmissionFailed))
    }

    async fn status(&self) -> Result<ProgressSnapshot, DomainError> {
        self.fetch_status()
            .await
            .map_err(|e| e.into_domain(DomainError::PollFailed))
    }
}
