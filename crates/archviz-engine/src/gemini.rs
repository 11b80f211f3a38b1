use std::sync::Arc;
use std::time::Duration;

use archviz_contracts::events::{EventKind, EventPayload, EventWriter};
use archviz_contracts::models::{AspectRatio, ModelSelector, Resolution, VideoAspectRatio};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::credentials::Credential;
use crate::error::GenerationError;
use crate::media::{ImageBytes, VideoBytes};
use crate::retry::{thread_sleeper, RetryNotice, RetryPolicy, Sleeper};
use crate::transport::GeminiTransport;

const ANALYSIS_INSTRUCTION: &str = "Act as a professional architectural photographer and 3D artist. Analyze this input image (sketch, photo, or map). Write a **highly detailed, photorealistic rendering prompt** based on the visual input. Describe the materials (e.g., polished marble, oak wood, brushed steel), specific lighting conditions (e.g., soft morning sunlight, cinematic shadows), colors, and architectural style in detail. Ensure the description implies high-end photography.";

const VIDEO_RESOLUTION: &str = "1080p";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub base_image: Option<ImageBytes>,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub prompt: String,
    pub base_image: ImageBytes,
    pub aspect_ratio: VideoAspectRatio,
}

/// Structured description returned by image analysis. All four fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prompt: String,
    pub style: String,
    pub lighting: String,
    pub environment: String,
}

/// Long-running video operation as last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    pub operation_handle: String,
    pub done: bool,
    pub result_uri: Option<String>,
}

/// Remote invocation layer: image generation, analysis and video generation.
#[derive(Clone)]
pub struct GeminiClient {
    api_base: String,
    transport: Arc<dyn GeminiTransport>,
    selector: ModelSelector,
    retry: RetryPolicy,
    poll_interval: Duration,
    poll_sleeper: Sleeper,
    events: EventWriter,
    analysis_model: Option<String>,
    video_model: Option<String>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("retry", &self.retry)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(config: &EngineConfig, transport: Arc<dyn GeminiTransport>) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            transport,
            selector: ModelSelector::new(None),
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay),
            poll_interval: config.video_poll_interval,
            poll_sleeper: thread_sleeper(),
            events: EventWriter::disabled("detached"),
            analysis_model: config.analysis_model.clone(),
            video_model: config.video_model.clone(),
        }
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = events;
        self
    }

    pub fn with_selector(mut self, selector: ModelSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Replaces both backoff and poll sleeping.
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.retry = self.retry.with_sleeper(Arc::clone(&sleeper));
        self.poll_sleeper = sleeper;
        self
    }

    fn endpoint_for_model(&self, model: &str, method: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:{}", self.api_base, model_path, method)
    }

    fn retry_observer<'a>(&'a self, model: &'a str) -> impl FnMut(&RetryNotice) + 'a {
        move |notice| {
            let mut payload = EventPayload::new();
            payload.insert("model".to_string(), json!(model));
            payload.insert("attempt".to_string(), json!(notice.attempt));
            payload.insert("max_attempts".to_string(), json!(notice.max_attempts));
            payload.insert(
                "delay_ms".to_string(),
                json!(notice.delay.as_millis() as u64),
            );
            payload.insert("error".to_string(), json!(notice.error.to_string()));
            self.events.record(EventKind::GenerationRetry, payload);
        }
    }

    pub fn generate_image(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<ImageBytes, GenerationError> {
        let plan = self
            .selector
            .image_plan(request.resolution)
            .map_err(GenerationError::InvalidInput)?;
        let endpoint = self.endpoint_for_model(&plan.model.name, "generateContent");

        let mut parts = Vec::new();
        if let Some(image) = request.base_image.as_ref() {
            parts.push(inline_part(image));
        }
        parts.push(json!({ "text": plan.apply_prefix(&request.prompt) }));

        let mut image_config = json!({ "aspectRatio": request.aspect_ratio.as_str() });
        if let Some(size) = plan.image_size.as_deref() {
            image_config["imageSize"] = json!(size);
        }
        let payload = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": image_config,
            },
        });

        tracing::info!(
            model = %plan.model.name,
            resolution = request.resolution.as_str(),
            aspect_ratio = request.aspect_ratio.as_str(),
            "generating image"
        );
        self.retry.run(
            |_| {
                let response =
                    self.transport
                        .post_json(&endpoint, credential.expose(), &payload)?;
                extract_first_image(&response)
            },
            self.retry_observer(&plan.model.name),
        )
    }

    pub fn analyze(
        &self,
        credential: &Credential,
        image: &ImageBytes,
        task_context: Option<&str>,
    ) -> Result<AnalysisResult, GenerationError> {
        let selection = self
            .selector
            .select(self.analysis_model.as_deref(), "vision")
            .map_err(GenerationError::InvalidInput)?;
        if let Some(reason) = selection.fallback_reason.as_deref() {
            tracing::warn!(reason, "analysis model fallback");
        }
        let model = selection.model.name;
        let endpoint = self.endpoint_for_model(&model, "generateContent");
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [inline_part(image), { "text": analysis_instruction(task_context) }],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": analysis_schema(),
            },
        });

        tracing::info!(model = %model, "analyzing image");
        let response = self
            .retry
            .run(
                |_| {
                    self.transport
                        .post_json(&endpoint, credential.expose(), &payload)
                },
                self.retry_observer(&model),
            )
            .map_err(|err| match err {
                GenerationError::MissingCredential => err,
                other => GenerationError::AnalysisError(other.to_string()),
            })?;
        parse_analysis(&response)
    }

    fn video_model(&self) -> Result<String, GenerationError> {
        self.selector
            .select(self.video_model.as_deref(), "video")
            .map(|selection| selection.model.name)
            .map_err(GenerationError::InvalidInput)
    }

    pub fn submit_video(
        &self,
        credential: &Credential,
        request: &VideoRequest,
    ) -> Result<RemoteJob, GenerationError> {
        let model = self.video_model()?;
        let endpoint = self.endpoint_for_model(&model, "predictLongRunning");
        let payload = json!({
            "instances": [{
                "prompt": request.prompt,
                "image": {
                    "bytesBase64Encoded": request.base_image.to_base64(),
                    "mimeType": request.base_image.mime_type,
                },
            }],
            "parameters": {
                "aspectRatio": request.aspect_ratio.as_str(),
                "resolution": VIDEO_RESOLUTION,
                "sampleCount": 1,
            },
        });

        tracing::info!(model = %model, aspect_ratio = request.aspect_ratio.as_str(), "submitting video");
        let response = self.retry.run(
            |_| {
                self.transport
                    .post_json(&endpoint, credential.expose(), &payload)
            },
            self.retry_observer(&model),
        )?;
        let job = parse_operation(&response)?;

        let mut event = EventPayload::new();
        event.insert("model".to_string(), json!(model));
        event.insert("operation".to_string(), json!(job.operation_handle));
        self.events.record(EventKind::VideoSubmitted, event);
        Ok(job)
    }

    pub fn poll_video(
        &self,
        credential: &Credential,
        job: &RemoteJob,
    ) -> Result<RemoteJob, GenerationError> {
        let url = format!(
            "{}/{}",
            self.api_base,
            job.operation_handle.trim_start_matches('/')
        );
        let response = self.transport.get_json(&url, credential.expose())?;
        let mut next = parse_operation(&response)?;
        if next.operation_handle.is_empty() {
            next.operation_handle = job.operation_handle.clone();
        }
        Ok(next)
    }

    /// Submits, polls at the configured interval until done, then downloads the clip.
    pub fn generate_video(
        &self,
        credential: &Credential,
        request: &VideoRequest,
    ) -> Result<VideoBytes, GenerationError> {
        let mut job = self.submit_video(credential, request)?;
        let mut polls = 0u64;
        while !job.done {
            (self.poll_sleeper)(self.poll_interval);
            job = self.poll_video(credential, &job)?;
            polls += 1;
            tracing::debug!(polls, done = job.done, "video operation polled");

            let mut event = EventPayload::new();
            event.insert("operation".to_string(), json!(job.operation_handle));
            event.insert("poll".to_string(), json!(polls));
            event.insert("done".to_string(), json!(job.done));
            self.events.record(EventKind::VideoPolled, event);
        }

        let uri = job.result_uri.ok_or(GenerationError::NoVideoProduced)?;
        let bytes = self
            .transport
            .download(&uri, credential.expose())
            .map_err(|err| GenerationError::DownloadFailed(err.to_string()))?;
        if bytes.is_empty() {
            return Err(GenerationError::DownloadFailed(
                "empty response body".to_string(),
            ));
        }
        tracing::info!(bytes = bytes.len(), polls, "video downloaded");
        Ok(VideoBytes::mp4(bytes))
    }
}

fn inline_part(image: &ImageBytes) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.to_base64(),
        }
    })
}

pub fn analysis_instruction(task_context: Option<&str>) -> String {
    match task_context.map(str::trim).filter(|value| !value.is_empty()) {
        Some(context) => format!(
            "{ANALYSIS_INSTRUCTION}\n\nSpecific Context/Task: {context}\n\nEnsure the generated prompt strictly follows this context while maintaining photorealism."
        ),
        None => ANALYSIS_INSTRUCTION.to_string(),
    }
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "prompt": { "type": "STRING" },
            "style": { "type": "STRING" },
            "lighting": { "type": "STRING" },
            "environment": { "type": "STRING" },
        },
        "required": ["prompt", "style", "lighting", "environment"],
    })
}

fn first_candidate_parts(response: &Value) -> Vec<Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// First inline image of the first candidate.
fn extract_first_image(response: &Value) -> Result<ImageBytes, GenerationError> {
    for part in first_candidate_parts(response) {
        let Some(inline) = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
            .and_then(Value::as_object)
        else {
            continue;
        };
        let data = inline
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if data.is_empty() {
            continue;
        }
        let bytes = BASE64.decode(data.as_bytes()).map_err(|err| {
            GenerationError::InvalidResponse(format!("image base64 decode failed: {err}"))
        })?;
        // Results are always surfaced as PNG data URIs.
        return Ok(ImageBytes::new(bytes, "image/png"));
    }
    if let Some(reason) = response
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        tracing::warn!(reason, "prompt blocked");
    }
    Err(GenerationError::NoImageProduced)
}

fn parse_analysis(response: &Value) -> Result<AnalysisResult, GenerationError> {
    let text: String = first_candidate_parts(response)
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    let trimmed = strip_code_fence(text.trim());
    if trimmed.is_empty() {
        return Err(GenerationError::AnalysisError(
            "empty analysis response".to_string(),
        ));
    }
    serde_json::from_str(trimmed)
        .map_err(|err| GenerationError::AnalysisError(format!("unexpected analysis shape: {err}")))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn parse_operation(response: &Value) -> Result<RemoteJob, GenerationError> {
    let done = response
        .get("done")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if let Some(error) = response.get("error").filter(|error| !error.is_null()) {
        let status = error
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(500);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("video operation failed")
            .to_string();
        return Err(GenerationError::Remote { status, message });
    }
    let operation_handle = response
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let result = response.get("response");
    let result_uri = result
        .and_then(|result| {
            result
                .pointer("/generateVideoResponse/generatedSamples/0/video/uri")
                .or_else(|| result.pointer("/generatedVideos/0/video/uri"))
        })
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(RemoteJob {
        operation_handle,
        done,
        result_uri,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::retry::recording_sleeper;
    use crate::testing::{image_response, overloaded, text_response, ScriptedTransport};

    fn client(transport: Arc<ScriptedTransport>) -> (GeminiClient, Arc<std::sync::Mutex<Vec<Duration>>>) {
        let (sleeper, slept) = recording_sleeper();
        let config = EngineConfig {
            api_base: "https://example.test/v1beta/".to_string(),
            ..EngineConfig::default()
        };
        (GeminiClient::new(&config, transport).with_sleeper(sleeper), slept)
    }

    fn key() -> Credential {
        Credential::new("test-key").unwrap()
    }

    fn request(resolution: Resolution) -> ImageRequest {
        ImageRequest {
            prompt: "a concrete villa".to_string(),
            base_image: Some(ImageBytes::new(vec![1, 2, 3], "image/jpeg")),
            aspect_ratio: AspectRatio::Wide16x9,
            resolution,
        }
    }

    #[test]
    fn one_k_request_uses_flash_model_without_size() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(image_response(&[9, 9])));
        let (client, _) = client(Arc::clone(&transport));

        let image = client.generate_image(&key(), &request(Resolution::OneK))?;
        assert_eq!(image.bytes, vec![9, 9]);
        assert_eq!(image.data_uri(), "data:image/png;base64,CQk=");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].url,
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(calls[0].api_key, "test-key");
        let payload = calls[0].payload.clone().unwrap_or_default();
        let parts = &payload["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], json!("image/jpeg"));
        assert_eq!(parts[0]["inlineData"]["data"], json!("AQID"));
        assert_eq!(parts[1]["text"], json!("a concrete villa"));
        assert_eq!(
            payload["generationConfig"]["imageConfig"],
            json!({"aspectRatio": "16:9"})
        );
        Ok(())
    }

    #[test]
    fn high_resolution_uses_pro_model_with_prefix_and_size() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(image_response(&[1])));
        let (client, _) = client(Arc::clone(&transport));

        client.generate_image(&key(), &request(Resolution::SixK))?;
        let call = &transport.calls()[0];
        assert!(call.url.ends_with("models/gemini-3-pro-image-preview:generateContent"));
        let payload = call.payload.clone().unwrap_or_default();
        assert_eq!(
            payload["contents"][0]["parts"][1]["text"],
            json!("[ULTRA HIGH FIDELITY ARCHITECTURAL RENDER - 6K OUTPUT]: a concrete villa")
        );
        assert_eq!(
            payload["generationConfig"]["imageConfig"]["imageSize"],
            json!("4K")
        );
        Ok(())
    }

    #[test]
    fn overload_is_retried_with_doubling_backoff() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_post(Err(overloaded()));
        transport.push_post(Err(overloaded()));
        transport.push_post(Ok(image_response(&[7])));
        let (client, slept) = client(Arc::clone(&transport));

        let image = client.generate_image(&key(), &request(Resolution::TwoK))?;
        assert_eq!(image.bytes, vec![7]);
        assert_eq!(transport.count("POST"), 3);
        assert_eq!(
            *slept.lock().unwrap(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
        Ok(())
    }

    #[test]
    fn persistent_overload_stops_after_three_attempts() {
        let transport = ScriptedTransport::new();
        for _ in 0..5 {
            transport.push_post(Err(overloaded()));
        }
        let (client, _) = client(Arc::clone(&transport));

        let err = client
            .generate_image(&key(), &request(Resolution::OneK))
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(transport.count("POST"), 3);
    }

    #[test]
    fn bad_request_is_not_retried() {
        let transport = ScriptedTransport::new();
        transport.push_post(Err(GenerationError::Remote {
            status: 400,
            message: "API key not valid".to_string(),
        }));
        let (client, slept) = client(Arc::clone(&transport));

        let err = client
            .generate_image(&key(), &request(Resolution::OneK))
            .unwrap_err();
        assert!(matches!(err, GenerationError::Remote { status: 400, .. }));
        assert_eq!(transport.count("POST"), 1);
        assert!(slept.lock().unwrap().is_empty());
    }

    #[test]
    fn text_only_response_is_no_image() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(text_response("I cannot draw that.")));
        let (client, _) = client(Arc::clone(&transport));
        assert_eq!(
            client.generate_image(&key(), &request(Resolution::OneK)),
            Err(GenerationError::NoImageProduced)
        );
        assert_eq!(transport.count("POST"), 1);
    }

    #[test]
    fn analysis_parses_structured_json() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(text_response(
            r#"{"prompt":"A glass pavilion at dusk","style":"Modern","lighting":"Golden hour","environment":"Lakeside"}"#,
        )));
        let (client, _) = client(Arc::clone(&transport));

        let image = ImageBytes::new(vec![1], "image/png");
        let result = client.analyze(&key(), &image, Some("Interior design"))?;
        assert_eq!(result.style, "Modern");
        assert_eq!(result.prompt, "A glass pavilion at dusk");

        let call = &transport.calls()[0];
        assert!(call.url.ends_with("models/gemini-3-pro-preview:generateContent"));
        let payload = call.payload.clone().unwrap_or_default();
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        let text = payload["contents"][0]["parts"][1]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        assert!(text.starts_with("Act as a professional architectural photographer"));
        assert!(text.contains("Specific Context/Task: Interior design"));
        Ok(())
    }

    #[test]
    fn analysis_missing_field_is_analysis_error() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(text_response(r#"{"prompt":"x","style":"y"}"#)));
        transport.push_post(Ok(text_response("not json at all")));
        let (client, _) = client(Arc::clone(&transport));
        let image = ImageBytes::new(vec![1], "image/png");

        assert!(matches!(
            client.analyze(&key(), &image, None),
            Err(GenerationError::AnalysisError(_))
        ));
        assert!(matches!(
            client.analyze(&key(), &image, None),
            Err(GenerationError::AnalysisError(_))
        ));
    }

    #[test]
    fn analysis_instruction_without_context_is_base_text() {
        assert_eq!(analysis_instruction(None), ANALYSIS_INSTRUCTION);
        assert_eq!(analysis_instruction(Some("  ")), ANALYSIS_INSTRUCTION);
        assert!(analysis_instruction(Some("Masterplan")).ends_with(
            "Ensure the generated prompt strictly follows this context while maintaining photorealism."
        ));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let response = text_response(
            "```json\n{\"prompt\":\"p\",\"style\":\"s\",\"lighting\":\"l\",\"environment\":\"e\"}\n```",
        );
        assert_eq!(
            parse_analysis(&response).map(|result| result.environment),
            Ok("e".to_string())
        );
    }

    fn video_request() -> VideoRequest {
        VideoRequest {
            prompt: "slow drone sweep".to_string(),
            base_image: ImageBytes::new(vec![4, 5], "image/png"),
            aspect_ratio: VideoAspectRatio::Portrait,
        }
    }

    #[test]
    fn video_polls_until_done_then_downloads() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(json!({"name": "models/veo/operations/op-1"})));
        transport.push_get(Ok(json!({"name": "models/veo/operations/op-1", "done": false})));
        transport.push_get(Ok(json!({
            "name": "models/veo/operations/op-1",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": "https://example.test/files/clip:download?alt=media"}}
            ]}}
        })));
        transport.push_download(Ok(vec![0, 0, 0, 24]));
        let (client, slept) = client(Arc::clone(&transport));

        let video = client.generate_video(&key(), &video_request())?;
        assert_eq!(video.bytes, vec![0, 0, 0, 24]);
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(
            *slept.lock().unwrap(),
            vec![Duration::from_secs(10), Duration::from_secs(10)]
        );

        let calls = transport.calls();
        assert!(calls[0]
            .url
            .ends_with("models/veo-3.1-fast-generate-preview:predictLongRunning"));
        let payload = calls[0].payload.clone().unwrap_or_default();
        assert_eq!(payload["parameters"]["aspectRatio"], json!("9:16"));
        assert_eq!(payload["parameters"]["resolution"], json!("1080p"));
        assert_eq!(payload["instances"][0]["image"]["bytesBase64Encoded"], json!("BAU="));
        assert_eq!(
            calls[1].url,
            "https://example.test/v1beta/models/veo/operations/op-1"
        );
        assert_eq!(calls[3].method, "DOWNLOAD");
        assert_eq!(calls[3].api_key, "test-key");
        Ok(())
    }

    #[test]
    fn finished_operation_without_uri_is_no_video() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(json!({"name": "op-2", "done": true, "response": {}})));
        let (client, _) = client(Arc::clone(&transport));
        assert_eq!(
            client.generate_video(&key(), &video_request()),
            Err(GenerationError::NoVideoProduced)
        );
        assert_eq!(transport.count("DOWNLOAD"), 0);
    }

    #[test]
    fn failed_download_is_reported() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(json!({
            "name": "op-3",
            "done": true,
            "response": {"generatedVideos": [{"video": {"uri": "https://example.test/clip"}}]}
        })));
        transport.push_download(Err(GenerationError::Remote {
            status: 403,
            message: "forbidden".to_string(),
        }));
        let (client, _) = client(Arc::clone(&transport));
        assert!(matches!(
            client.generate_video(&key(), &video_request()),
            Err(GenerationError::DownloadFailed(_))
        ));
    }

    #[test]
    fn overloaded_poll_fails_without_retry() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(json!({"name": "op-5"})));
        transport.push_get(Err(overloaded()));
        let (client, slept) = client(Arc::clone(&transport));

        let result = client.generate_video(&key(), &video_request());
        assert!(matches!(result, Err(GenerationError::Transient { status: 503, .. })));
        assert_eq!(transport.count("GET"), 1);
        assert_eq!(transport.count("DOWNLOAD"), 0);
        assert_eq!(*slept.lock().unwrap(), vec![Duration::from_secs(10)]);
    }

    #[test]
    fn operation_error_surfaces_as_remote_failure() {
        let transport = ScriptedTransport::new();
        transport.push_post(Ok(json!({"name": "op-4"})));
        transport.push_get(Ok(json!({
            "name": "op-4",
            "done": true,
            "error": {"code": 403, "message": "billing required"}
        })));
        let (client, _) = client(Arc::clone(&transport));
        assert_eq!(
            client.generate_video(&key(), &video_request()),
            Err(GenerationError::Remote {
                status: 403,
                message: "billing required".to_string()
            })
        );
    }
}
