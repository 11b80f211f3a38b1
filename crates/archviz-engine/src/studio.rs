use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use archviz_contracts::events::{EventKind, EventPayload, EventWriter};
use archviz_contracts::models::{AspectRatio, Resolution, VideoAspectRatio};
use archviz_contracts::store::{artifact_id, GeneratedArtifact, HistoryStore, LocalStore};
use archviz_contracts::{assemble, WorkflowKind, WorkflowSelection};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::batch::generate_batch;
use crate::credentials::{CredentialResolver, ResolvedCredential};
use crate::error::GenerationError;
use crate::gemini::{AnalysisResult, GeminiClient, ImageRequest, VideoRequest};
use crate::media::{ImageBytes, VideoBytes};

pub const MAX_BATCH: usize = 4;

pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub kind: WorkflowKind,
    pub selections: WorkflowSelection,
    pub free_text: String,
    pub base_image: Option<ImageBytes>,
    /// Falls back to the workflow's default ratio.
    pub aspect_ratio: Option<AspectRatio>,
    /// Ignored by workflows that carry their own resolution.
    pub resolution: Resolution,
    pub quantity: usize,
}

impl ImageJob {
    pub fn new(kind: WorkflowKind) -> Self {
        Self {
            kind,
            selections: WorkflowSelection::new(),
            free_text: String::new(),
            base_image: None,
            aspect_ratio: None,
            resolution: Resolution::default(),
            quantity: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub free_text: String,
    pub base_image: ImageBytes,
    pub aspect_ratio: VideoAspectRatio,
}

/// Where generated bytes end up; the history URL follows from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutput {
    DataUri,
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutput {
    pub prompt: String,
    pub images: Vec<ImageBytes>,
    pub artifacts: Vec<GeneratedArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOutput {
    pub prompt: String,
    pub video: VideoBytes,
    pub artifact: GeneratedArtifact,
}

/// Ties prompt assembly, credentials, remote calls, history and the event log together.
#[derive(Debug)]
pub struct Studio {
    client: GeminiClient,
    credentials: CredentialResolver,
    store_path: PathBuf,
    events: EventWriter,
    batch_stagger: Duration,
}

impl Studio {
    pub fn new(
        client: GeminiClient,
        credentials: CredentialResolver,
        store_path: impl Into<PathBuf>,
        events: EventWriter,
        batch_stagger: Duration,
    ) -> Self {
        Self {
            client: client.with_events(events.clone()),
            credentials,
            store_path: store_path.into(),
            events,
            batch_stagger,
        }
    }

    pub fn events(&self) -> &EventWriter {
        &self.events
    }

    pub fn credentials(&mut self) -> &mut CredentialResolver {
        &mut self.credentials
    }

    pub fn preview_prompt(
        &self,
        kind: WorkflowKind,
        selections: &WorkflowSelection,
        free_text: &str,
    ) -> String {
        assemble(kind, selections, free_text)
    }

    pub fn history(&self, kind: &WorkflowKind) -> HistoryStore {
        self.history_for_key(&kind.history_key())
    }

    pub fn history_for_key(&self, key: &str) -> HistoryStore {
        HistoryStore::open(LocalStore::new(&self.store_path), key)
    }

    pub fn run_image_workflow(
        &mut self,
        job: &ImageJob,
        output: &ArtifactOutput,
    ) -> Result<WorkflowOutput, GenerationError> {
        let result = self.try_image_workflow(job, output);
        self.record_failure(&job.kind, &result);
        result
    }

    fn try_image_workflow(
        &mut self,
        job: &ImageJob,
        output: &ArtifactOutput,
    ) -> Result<WorkflowOutput, GenerationError> {
        validate_image_job(job)?;
        let resolved = self.credentials.resolve()?;

        let prompt = assemble(job.kind, &job.selections, &job.free_text);
        let request = ImageRequest {
            prompt: prompt.clone(),
            base_image: job.base_image.clone(),
            aspect_ratio: job
                .aspect_ratio
                .unwrap_or_else(|| job.kind.default_aspect_ratio()),
            resolution: job.kind.resolution().unwrap_or(job.resolution),
        };
        self.record_start(&job.kind, &resolved, |payload| {
            payload.insert("resolution".to_string(), json!(request.resolution.as_str()));
            payload.insert(
                "aspect_ratio".to_string(),
                json!(request.aspect_ratio.as_str()),
            );
            payload.insert("quantity".to_string(), json!(job.quantity));
        });

        let images = generate_batch(
            &self.client,
            &resolved.credential,
            &request,
            job.quantity,
            self.batch_stagger,
        )?;

        let stamp = Utc::now().timestamp_millis();
        let label = job.kind.history_label(&prompt);
        let mut artifacts = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let batch_index = (images.len() > 1).then_some(index);
            let id = artifact_id(stamp, batch_index);
            let url = match output {
                ArtifactOutput::DataUri => image.data_uri(),
                ArtifactOutput::Directory(dir) => write_artifact(
                    dir,
                    &format!("{}-{id}.{}", job.kind.history_slug(), image.extension()),
                    &image.bytes,
                )?,
            };
            artifacts.push(GeneratedArtifact::new(id, url, label.clone(), stamp));
        }

        let mut history = self.history(&job.kind);
        history.append_batch(artifacts.clone())?;
        for artifact in &artifacts {
            self.record_artifact(&job.kind, artifact);
        }
        tracing::info!(
            workflow = %job.kind,
            count = artifacts.len(),
            history = history.key(),
            "workflow completed"
        );

        Ok(WorkflowOutput {
            prompt,
            images,
            artifacts,
        })
    }

    pub fn run_video(
        &mut self,
        job: &VideoJob,
        out_dir: &Path,
    ) -> Result<VideoOutput, GenerationError> {
        let kind = WorkflowKind::Video;
        let result = self.try_video(job, out_dir);
        self.record_failure(&kind, &result);
        result
    }

    fn try_video(&mut self, job: &VideoJob, out_dir: &Path) -> Result<VideoOutput, GenerationError> {
        let kind = WorkflowKind::Video;
        let resolved = self.credentials.resolve()?;
        let prompt = assemble(kind, &WorkflowSelection::new(), &job.free_text);
        self.record_start(&kind, &resolved, |payload| {
            payload.insert("aspect_ratio".to_string(), json!(job.aspect_ratio.as_str()));
        });

        let request = VideoRequest {
            prompt: prompt.clone(),
            base_image: job.base_image.clone(),
            aspect_ratio: job.aspect_ratio,
        };
        let video = self.client.generate_video(&resolved.credential, &request)?;

        let stamp = Utc::now().timestamp_millis();
        let id = artifact_id(stamp, None);
        let url = write_artifact(
            out_dir,
            &format!("{}-{id}.{}", kind.history_slug(), video.extension()),
            &video.bytes,
        )?;
        let artifact = GeneratedArtifact::new(id, url, prompt.clone(), stamp);
        self.history(&kind).append(artifact.clone())?;
        self.record_artifact(&kind, &artifact);

        Ok(VideoOutput {
            prompt,
            video,
            artifact,
        })
    }

    /// Auto-detect: describes the image, steered by the workflow's analysis context.
    pub fn analyze(
        &mut self,
        kind: Option<WorkflowKind>,
        image: &ImageBytes,
    ) -> Result<AnalysisResult, GenerationError> {
        let resolved = self.credentials.resolve()?;
        let context = kind.as_ref().and_then(WorkflowKind::analysis_context);
        let result = self
            .client
            .analyze(&resolved.credential, image, context.as_deref());

        match &result {
            Ok(analysis) => {
                let mut payload = EventPayload::new();
                payload.insert(
                    "workflow".to_string(),
                    kind.map(|kind| json!(kind.to_string()))
                        .unwrap_or(Value::Null),
                );
                payload.insert("style".to_string(), json!(analysis.style));
                self.events.record(EventKind::AnalysisCompleted, payload);
            }
            Err(err) => {
                if let Some(kind) = kind.as_ref() {
                    self.record_failure::<()>(kind, &Err(err.clone()));
                }
            }
        }
        result
    }

    fn record_start(
        &self,
        kind: &WorkflowKind,
        resolved: &ResolvedCredential,
        extend: impl FnOnce(&mut EventPayload),
    ) {
        let mut payload = EventPayload::new();
        payload.insert("workflow".to_string(), json!(kind.to_string()));
        payload.insert(
            "credential_source".to_string(),
            json!(resolved.source.as_str()),
        );
        extend(&mut payload);
        self.events.record(EventKind::WorkflowStarted, payload);
    }

    fn record_artifact(&self, kind: &WorkflowKind, artifact: &GeneratedArtifact) {
        let mut payload = EventPayload::new();
        payload.insert("workflow".to_string(), json!(kind.to_string()));
        payload.insert("history_key".to_string(), json!(kind.history_key()));
        payload.insert("artifact".to_string(), Value::from(artifact));
        self.events.record(EventKind::ArtifactCreated, payload);
    }

    fn record_failure<T>(&self, kind: &WorkflowKind, result: &Result<T, GenerationError>) {
        let Err(err) = result else {
            return;
        };
        tracing::error!(workflow = %kind, error = %err, "workflow failed");
        let mut payload = EventPayload::new();
        payload.insert("workflow".to_string(), json!(kind.to_string()));
        payload.insert("error_kind".to_string(), json!(err.kind()));
        payload.insert("error".to_string(), json!(err.to_string()));
        self.events.record(EventKind::WorkflowFailed, payload);
    }
}

fn validate_image_job(job: &ImageJob) -> Result<(), GenerationError> {
    if job.base_image.is_none() {
        return Err(GenerationError::InvalidInput(
            "Please upload a source image first.".to_string(),
        ));
    }
    if job.kind.requires_free_text() && job.free_text.trim().is_empty() {
        return Err(GenerationError::InvalidInput(
            "Please describe the edit to apply.".to_string(),
        ));
    }
    if job.kind == WorkflowKind::Video {
        return Err(GenerationError::InvalidInput(
            "Video is generated through the video workflow.".to_string(),
        ));
    }
    if !(1..=MAX_BATCH).contains(&job.quantity) {
        return Err(GenerationError::InvalidInput(format!(
            "Quantity must be between 1 and {MAX_BATCH}."
        )));
    }
    Ok(())
}

fn write_artifact(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<String, GenerationError> {
    fs::create_dir_all(dir).map_err(|err| {
        GenerationError::Storage(format!("failed to create {}: {err}", dir.display()))
    })?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).map_err(|err| {
        GenerationError::Storage(format!("failed to write {}: {err}", path.display()))
    })?;
    let absolute = fs::canonicalize(&path).unwrap_or(path);
    Ok(format!("file://{}", absolute.display()))
}
