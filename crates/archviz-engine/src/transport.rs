use std::error::Error as StdError;
use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::Value;

use crate::error::GenerationError;

/// Authenticated JSON and byte transfer against the generative endpoint.
pub trait GeminiTransport: Send + Sync {
    fn post_json(&self, url: &str, api_key: &str, payload: &Value)
        -> Result<Value, GenerationError>;

    fn get_json(&self, url: &str, api_key: &str) -> Result<Value, GenerationError>;

    fn download(&self, url: &str, api_key: &str) -> Result<Vec<u8>, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(),
            timeout,
        }
    }
}

impl GeminiTransport for HttpTransport {
    fn post_json(
        &self,
        url: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<Value, GenerationError> {
        tracing::debug!(url = %url, "POST");
        let response = self
            .http
            .post(url)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(payload)
            .send()
            .map_err(|err| transport_error(url, &err))?;
        response_json_or_error(response)
    }

    fn get_json(&self, url: &str, api_key: &str) -> Result<Value, GenerationError> {
        tracing::debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .send()
            .map_err(|err| transport_error(url, &err))?;
        response_json_or_error(response)
    }

    fn download(&self, url: &str, api_key: &str) -> Result<Vec<u8>, GenerationError> {
        tracing::debug!(url = %url, "download");
        let response = self
            .http
            .get(url)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .send()
            .map_err(|err| transport_error(url, &err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }
        let bytes = response
            .bytes()
            .map_err(|err| transport_error(url, &err))?;
        Ok(bytes.to_vec())
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> GenerationError {
    // Strip the query string; it carries the key.
    let endpoint = url.split('?').next().unwrap_or(url);
    let mut text = format!("request to {endpoint} failed: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&format!(" | caused by: {cause}"));
        source = cause.source();
    }
    GenerationError::Transport(truncate_text(&redact_key(&text), 512))
}

fn response_json_or_error(response: HttpResponse) -> Result<Value, GenerationError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| GenerationError::Transport(format!("response body read failed: {err}")))?;
    if !status.is_success() {
        return Err(classify_failure(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|err| {
        GenerationError::InvalidResponse(format!("invalid JSON payload: {err}"))
    })
}

/// Maps a failed response to the error taxonomy.
///
/// HTTP 429/503 and the `RESOURCE_EXHAUSTED`/`UNAVAILABLE` body statuses are transient.
pub fn classify_failure(status: u16, body: &str) -> GenerationError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|value| value.get("error"));
    let body_status = error
        .and_then(|error| error.get("status"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let message = error
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());
    let message = truncate_text(&message, 512);

    let transient = matches!(status, 429 | 503)
        || matches!(body_status, "RESOURCE_EXHAUSTED" | "UNAVAILABLE")
        || message.contains("RESOURCE_EXHAUSTED")
        || message.contains("UNAVAILABLE");
    if transient {
        GenerationError::Transient { status, message }
    } else {
        GenerationError::Remote { status, message }
    }
}

fn redact_key(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find("key=") {
        out.push_str(&rest[..index + 4]);
        out.push_str("***");
        rest = &rest[index + 4..];
        let end = rest
            .find(|ch: char| ch == '&' || ch == ')' || ch.is_whitespace())
            .unwrap_or(rest.len());
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
