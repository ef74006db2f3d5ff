use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{AnalysisResult, AuthReply, Cv, JobDescription, Session};

// --- Result contract ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Conflict,
    Server,
    Network,
    Decode,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Server => "server",
            ErrorKind::Network => "network",
            ErrorKind::Decode => "decode",
            ErrorKind::Io => "local file",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::new(ErrorKind::Network, "Request timed out")
        } else if err.is_connect() {
            ApiError::new(ErrorKind::Network, "Could not reach the server")
        } else if err.is_decode() {
            ApiError::new(ErrorKind::Decode, format!("Unexpected response from server: {}", err))
        } else {
            ApiError::new(ErrorKind::Network, err.to_string())
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        400 | 422 => ErrorKind::Validation,
        401 | 403 => ErrorKind::Unauthorized,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        _ => ErrorKind::Server,
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn message_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collapses the backend's response shapes into one result.
///
/// Payloads arrive as `{success, <key>: ...}`, `{data: ...}`, a bare array, or
/// the object itself; failures as `{error}` or `{success: false}`.
pub fn normalize(status: u16, body: Value, keys: &[&str]) -> ApiResult<Value> {
    if let Value::Object(map) = &body {
        if let Some(err) = map.get("error").filter(|e| !e.is_null()) {
            let kind = if is_success(status) { ErrorKind::Server } else { kind_for_status(status) };
            return Err(ApiError::new(kind, message_of(err)));
        }
        if map.get("success") == Some(&Value::Bool(false)) {
            let message = map
                .get("message")
                .map(message_of)
                .unwrap_or_else(|| "Request failed".to_string());
            let kind = if is_success(status) { ErrorKind::Server } else { kind_for_status(status) };
            return Err(ApiError::new(kind, message));
        }
    }

    if !is_success(status) {
        return Err(ApiError::new(kind_for_status(status), format!("HTTP {}: {}", status, body)));
    }

    match body {
        Value::Object(mut map) => {
            for key in keys.iter().chain(["data"].iter()) {
                if let Some(payload) = map.remove(*key) {
                    return Ok(payload);
                }
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    }
}

pub fn parse_body(status: u16, text: &str, keys: &[&str]) -> ApiResult<Value> {
    if text.trim().is_empty() {
        return if is_success(status) {
            Ok(Value::Null)
        } else {
            Err(ApiError::new(kind_for_status(status), format!("HTTP {}", status)))
        };
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => normalize(status, value, keys),
        Err(_) if is_success(status) => Err(ApiError::new(
            ErrorKind::Decode,
            "Unexpected response from server",
        )),
        Err(_) => Err(ApiError::new(kind_for_status(status), text.trim().to_string())),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::new(ErrorKind::Decode, format!("Unexpected response from server: {}", e)))
}

/// Lists come back as `null` when the user has nothing yet.
fn decode_list<T: DeserializeOwned>(value: Value) -> ApiResult<Vec<T>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(value)
}

// --- Backend trait ---

pub trait Backend: Send + Sync {
    fn register(&self, email: &str, password: &str) -> ApiResult<Session>;
    fn login(&self, email: &str, password: &str) -> ApiResult<Session>;
    fn health(&self) -> ApiResult<Value>;
    fn upload_cv(&self, user_id: i64, path: &Path) -> ApiResult<()>;
    fn list_cvs(&self, user_id: i64) -> ApiResult<Vec<Cv>>;
    fn delete_cv(&self, cv_id: i64) -> ApiResult<()>;
    fn save_job_description(&self, user_id: i64, title: &str, content: &str) -> ApiResult<()>;
    fn list_job_descriptions(&self, user_id: i64) -> ApiResult<Vec<JobDescription>>;
    fn delete_job_description(&self, job_id: i64) -> ApiResult<()>;
    fn analyze(&self, user_id: i64, cv_id: i64, job_description_id: i64) -> ApiResult<AnalysisResult>;
    fn analysis_history(&self, user_id: i64) -> ApiResult<Vec<AnalysisResult>>;
    fn analysis_result(&self, result_id: i64) -> ApiResult<AnalysisResult>;
    fn delete_analysis_result(&self, result_id: i64) -> ApiResult<()>;
    fn export_cv(&self, result_id: i64) -> ApiResult<String>;
}

// --- HTTP client ---

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct JobDescriptionRequest<'a> {
    user_id: i64,
    title: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    user_id: i64,
    cv_id: i64,
    job_description_id: i64,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cvscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder, keys: &[&str]) -> ApiResult<Value> {
        let response = request.send().map_err(|e| {
            warn!(error = %e, "request failed");
            ApiError::from(e)
        })?;
        let status = response.status().as_u16();
        let text = response.text()?;
        debug!(status, bytes = text.len(), "response received");
        let result = parse_body(status, &text, keys);
        if let Err(err) = &result {
            warn!(status, kind = %err.kind, message = %err.message, "request rejected");
        }
        result
    }

    fn auth(&self, path: &str, email: &str, password: &str) -> ApiResult<Session> {
        debug!(path, "auth request");
        let body = Credentials { email, password };
        let value = self.send(self.client.post(self.url(path)).json(&body), &[])?;
        let reply: AuthReply = decode(value)?;
        Ok(reply.into_session(email))
    }
}

impl Backend for ApiClient {
    fn register(&self, email: &str, password: &str) -> ApiResult<Session> {
        self.auth("/register", email, password)
    }

    fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        self.auth("/login", email, password)
    }

    fn health(&self) -> ApiResult<Value> {
        debug!("GET /health");
        self.send(self.client.get(self.url("/health")), &[])
    }

    fn upload_cv(&self, user_id: i64, path: &Path) -> ApiResult<()> {
        debug!(user_id, path = %path.display(), "POST /upload-cv");
        let form = multipart::Form::new()
            .text("user_id", user_id.to_string())
            .file("cv", path)
            .map_err(|e| ApiError::validation(format!("Failed to read {}: {}", path.display(), e)))?;
        self.send(self.client.post(self.url("/upload-cv")).multipart(form), &[])?;
        Ok(())
    }

    fn list_cvs(&self, user_id: i64) -> ApiResult<Vec<Cv>> {
        debug!(user_id, "GET /user-cvs");
        let request = self.client.get(self.url("/user-cvs")).query(&[("user_id", user_id)]);
        decode_list(self.send(request, &["cvs"])?)
    }

    fn delete_cv(&self, cv_id: i64) -> ApiResult<()> {
        debug!(cv_id, "DELETE /cv");
        self.send(self.client.delete(self.url(&format!("/cv/{}", cv_id))), &[])?;
        Ok(())
    }

    fn save_job_description(&self, user_id: i64, title: &str, content: &str) -> ApiResult<()> {
        debug!(user_id, "POST /job-description");
        let body = JobDescriptionRequest { user_id, title, content };
        self.send(self.client.post(self.url("/job-description")).json(&body), &[])?;
        Ok(())
    }

    fn list_job_descriptions(&self, user_id: i64) -> ApiResult<Vec<JobDescription>> {
        debug!(user_id, "GET /user-job-descriptions");
        let request = self
            .client
            .get(self.url("/user-job-descriptions"))
            .query(&[("user_id", user_id)]);
        decode_list(self.send(request, &["job_descriptions"])?)
    }

    fn delete_job_description(&self, job_id: i64) -> ApiResult<()> {
        debug!(job_id, "DELETE /job-description");
        self.send(
            self.client.delete(self.url(&format!("/job-description/{}", job_id))),
            &[],
        )?;
        Ok(())
    }

    fn analyze(&self, user_id: i64, cv_id: i64, job_description_id: i64) -> ApiResult<AnalysisResult> {
        debug!(user_id, cv_id, job_description_id, "POST /analyze");
        let body = AnalyzeRequest { user_id, cv_id, job_description_id };
        decode(self.send(self.client.post(self.url("/analyze")).json(&body), &["analysis", "result"])?)
    }

    fn analysis_history(&self, user_id: i64) -> ApiResult<Vec<AnalysisResult>> {
        debug!(user_id, "GET /analysis-history");
        let request = self
            .client
            .get(self.url("/analysis-history"))
            .query(&[("user_id", user_id)]);
        decode_list(self.send(request, &["history", "analyses"])?)
    }

    fn analysis_result(&self, result_id: i64) -> ApiResult<AnalysisResult> {
        debug!(result_id, "GET /analysis-result");
        let request = self.client.get(self.url(&format!("/analysis-result/{}", result_id)));
        decode(self.send(request, &["analysis", "result"])?)
    }

    fn delete_analysis_result(&self, result_id: i64) -> ApiResult<()> {
        debug!(result_id, "DELETE /analysis-result");
        self.send(
            self.client.delete(self.url(&format!("/analysis-result/{}", result_id))),
            &[],
        )?;
        Ok(())
    }

    fn export_cv(&self, result_id: i64) -> ApiResult<String> {
        debug!(result_id, "GET /export-cv");
        let response = self
            .client
            .get(self.url(&format!("/export-cv/{}", result_id)))
            .query(&[("format", "txt")])
            .send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        if is_success(status) {
            Ok(text)
        } else {
            // Error bodies are JSON even though the payload is plain text.
            let err = match parse_body(status, &text, &[]) {
                Err(err) => err,
                Ok(_) => ApiError::new(kind_for_status(status), format!("HTTP {}", status)),
            };
            Err(err)
        }
    }
}
