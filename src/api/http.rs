//! `HttpBackend`: the reqwest implementation of [`SynthesisBackend`].
//!
//! All connection details come from [`ServerConfig`]; nothing is hardcoded
//! beyond the endpoint paths.  The config, voices and cancel requests carry
//! `request_timeout_secs` as a per-request deadline.  Synthesis gets none:
//! its timeout is a server-side parameter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Response};

use crate::api::backend::{ApiError, AudioResponse, SynthesisBackend};
use crate::api::types::{ErrorBody, SynthesisRequest, TaskId, VoiceListResponse};
use crate::config::ServerConfig;

/// Detail used when a failed synthesize response carries no parsable JSON.
const INVALID_ERROR_BODY: &str = "Server error or invalid JSON response.";

/// Talks to the synthesis server over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpBackend {
    /// Build an `HttpBackend` from the local server settings.
    ///
    /// The client carries only the connect timeout; the request deadline is
    /// applied per call.  A default client is used as a fallback if the
    /// builder fails.
    pub fn from_config(config: &ServerConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Convert a non-2xx response into [`ApiError::Server`].
///
/// `detail` from the JSON body wins; otherwise `on_invalid_json` (when
/// given) or the generic `"<prefix> <code>"` status line is used.
async fn server_error(response: Response, status_prefix: &str, on_invalid_json: Option<&str>) -> ApiError {
    let status = response.status().as_u16();
    let generic = format!("{status_prefix} {status}");

    let detail = match response.json::<ErrorBody>().await {
        Ok(body) => body.detail.filter(|d| !d.is_empty()).unwrap_or(generic),
        Err(_) => on_invalid_json.map(str::to_string).unwrap_or(generic),
    };

    ApiError::Server { status, detail }
}

#[async_trait]
impl SynthesisBackend for HttpBackend {
    async fn fetch_config(&self) -> Result<serde_json::Value, ApiError> {
        let response = self
            .client
            .get(self.url("/api/config"))
            .timeout(self.request_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response, "HTTP error! status:", None).await);
        }
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn list_voices(&self) -> Result<VoiceListResponse, ApiError> {
        let response = self
            .client
            .get(self.url("/api/voices"))
            .timeout(self.request_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response, "HTTP error! status:", None).await);
        }
        response
            .json::<VoiceListResponse>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioResponse, ApiError> {
        log::debug!(
            "http: POST /api/synthesize task={} voice={} format={} chars={}",
            request.task_id,
            request.voice_name,
            request.audio_format,
            request.text.chars().count()
        );

        let response = self
            .client
            .post(self.url("/api/synthesize"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                server_error(response, "HTTP error! Status:", Some(INVALID_ERROR_BODY)).await,
            );
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(AudioResponse::new(content_type, async move {
            let bytes = response.bytes().await?;
            Ok(bytes.to_vec())
        }))
    }

    async fn cancel_task(&self, task_id: &TaskId) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/cancel_task/{task_id}"));
        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response, "HTTP error! status:", None).await);
        }

        // The acknowledgment body is optional and non-authoritative.
        let body = response.text().await.unwrap_or_default();
        log::debug!("http: cancel acknowledged for {task_id}: {body}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
