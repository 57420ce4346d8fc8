//! HTTP client for the domain-intelligence service.
//!
//! One `reqwest::Client` is shared by every caller; endpoints are thin
//! methods over a pair of JSON/multipart helpers with a common error
//! decoding path.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::types::{
    AnalysisResult, BatchJob, ChatEnvelope, ClientError, EmailPreview, UploadAck,
};

/// Time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Time allowed for a whole request, body included. Single analysis can
/// take a while server-side; this is the ceiling that frees a stuck guard.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    email: &'a str,
    force_refresh: bool,
}

#[derive(Serialize)]
struct ChatMessageRequest<'a> {
    session_id: &'a str,
    message: &'a str,
    message_type: &'a str,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Websocket address for a session's push channel, derived from the
    /// HTTP base so both always point at the same host.
    pub fn ws_url(&self, session_id: &str) -> Result<String, ClientError> {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(ClientError::Validation(format!(
                "base url '{}' is not http(s)",
                self.base_url
            )));
        };
        Ok(format!("{ws_base}/ws/{session_id}"))
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .get(self.endpoint("/health"))
            .send()
            .await
            .map_err(map_transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let bytes = response.bytes().await.unwrap_or_default();
            Err(service_error(status, &bytes))
        }
    }

    pub async fn analyze(
        &self,
        email: &str,
        force_refresh: bool,
    ) -> Result<AnalysisResult, ClientError> {
        self.post_json(
            "/analyze",
            &AnalyzeRequest {
                email,
                force_refresh,
            },
        )
        .await
    }

    pub async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatEnvelope, ClientError> {
        self.post_json(
            "/chat/message",
            &ChatMessageRequest {
                session_id,
                message,
                message_type: "user",
            },
        )
        .await
    }

    pub async fn preview_csv(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<EmailPreview, ClientError> {
        let form = csv_form(session_id, file_name, bytes)?;
        self.post_multipart("/chat/preview-csv", form).await
    }

    /// Direct processing path for uploads under the batch threshold.
    pub async fn upload_csv(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadAck, ClientError> {
        let form = csv_form(session_id, file_name, bytes)?;
        self.post_multipart("/chat/upload-csv", form).await
    }

    /// Queues a batch job for larger uploads.
    pub async fn submit_batch(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        concurrency: u32,
    ) -> Result<BatchJob, ClientError> {
        let form = csv_form(session_id, file_name, bytes)?.text("concurrency", concurrency.to_string());
        self.post_multipart("/batch/submit-csv", form).await
    }

    pub async fn batch_status(&self, batch_id: &str) -> Result<BatchJob, ClientError> {
        self.get_json(&format!("/batch/status/{batch_id}")).await
    }

    pub async fn batch_results(
        &self,
        batch_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AnalysisResult>, ClientError> {
        self.get_json(&format!(
            "/batch/results/{batch_id}?offset={offset}&limit={limit}"
        ))
        .await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(map_transport)?;
        decode_response(response).await
    }

    async fn post_json<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Res, ClientError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .header("x-request-id", request_id())
            .json(body)
            .send()
            .await
            .map_err(map_transport)?;
        decode_response(response).await
    }

    async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .header("x-request-id", request_id())
            .multipart(form)
            .send()
            .await
            .map_err(map_transport)?;
        decode_response(response).await
    }
}

fn csv_form(
    session_id: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<reqwest::multipart::Form, ClientError> {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str("text/csv")
        .map_err(|e| ClientError::Validation(e.to_string()))?;
    Ok(reqwest::multipart::Form::new()
        .text("session_id", session_id.to_string())
        .part("file", part))
}

fn request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

fn map_transport(error: reqwest::Error) -> ClientError {
    ClientError::Network(error.to_string())
}

/// Decodes a response body, honoring two service conventions: failure
/// statuses carry `{"error": ...}` or `{"detail": ...}`, and some upload
/// endpoints report failures as an `error` key under a 200.
async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    if !status.is_success() {
        return Err(service_error(status, &bytes));
    }
    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        ClientError::Service {
            status: status.as_u16(),
            message: format!("unexpected response body: {e}"),
        }
    })?;
    if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
        return Err(ClientError::Service {
            status: status.as_u16(),
            message: message.to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| ClientError::Service {
        status: status.as_u16(),
        message: format!("unexpected response shape: {e}"),
    })
}

fn service_error(status: reqwest::StatusCode, bytes: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("detail"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    ClientError::Service {
        status: status.as_u16(),
        message,
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ClientError::Validation(format!("invalid base url '{trimmed}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ClientError::Validation(format!(
            "unsupported scheme '{other}' in base url"
        ))),
    }
}
