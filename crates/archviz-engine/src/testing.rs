use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use crate::error::GenerationError;
use crate::transport::GeminiTransport;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub api_key: String,
    pub payload: Option<Value>,
}

/// Transport replaying queued responses in order and recording every call.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    posts: Mutex<VecDeque<Result<Value, GenerationError>>>,
    gets: Mutex<VecDeque<Result<Value, GenerationError>>>,
    downloads: Mutex<VecDeque<Result<Vec<u8>, GenerationError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_post(&self, response: Result<Value, GenerationError>) {
        self.posts.lock().unwrap().push_back(response);
    }

    pub fn push_get(&self, response: Result<Value, GenerationError>) {
        self.gets.lock().unwrap().push_back(response);
    }

    pub fn push_download(&self, response: Result<Vec<u8>, GenerationError>) {
        self.downloads.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    fn record(&self, method: &'static str, url: &str, api_key: &str, payload: Option<&Value>) {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            api_key: api_key.to_string(),
            payload: payload.cloned(),
        });
    }
}

fn exhausted<T>() -> Result<T, GenerationError> {
    Err(GenerationError::Transport("script exhausted".to_string()))
}

impl GeminiTransport for ScriptedTransport {
    fn post_json(
        &self,
        url: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<Value, GenerationError> {
        self.record("POST", url, api_key, Some(payload));
        self.posts.lock().unwrap().pop_front().unwrap_or_else(exhausted)
    }

    fn get_json(&self, url: &str, api_key: &str) -> Result<Value, GenerationError> {
        self.record("GET", url, api_key, None);
        self.gets.lock().unwrap().pop_front().unwrap_or_else(exhausted)
    }

    fn download(&self, url: &str, api_key: &str) -> Result<Vec<u8>, GenerationError> {
        self.record("DOWNLOAD", url, api_key, None);
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(exhausted)
    }
}

pub(crate) fn image_response(bytes: &[u8]) -> Value {
    json!({
        "candidates": [{
            "content": {
                "parts": [
                    {"text": "Here is your render."},
                    {"inlineData": {"mimeType": "image/png", "data": BASE64.encode(bytes)}}
                ]
            }
        }]
    })
}

pub(crate) fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

pub(crate) fn overloaded() -> GenerationError {
    GenerationError::Transient {
        status: 503,
        message: "The model is overloaded.".to_string(),
    }
}
