/// Failure taxonomy of remote generation. Every variant maps to one user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no API key available")]
    MissingCredential,

    #[error("remote model overloaded ({status}): {message}")]
    Transient { status: u16, message: String },

    #[error("remote request failed ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("remote response could not be read: {0}")]
    InvalidResponse(String),

    #[error("no image generated")]
    NoImageProduced,

    #[error("video generation failed - no URI returned")]
    NoVideoProduced,

    #[error("video download failed: {0}")]
    DownloadFailed(String),

    #[error("analysis failed: {0}")]
    AnalysisError(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("local storage failure: {0}")]
    Storage(String),
}

impl GenerationError {
    /// Overloaded and rate-limited failures are the only retry-safe ones.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Transient { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential => "missing_credential",
            GenerationError::Transient { .. } => "transient",
            GenerationError::Remote { .. } => "remote",
            GenerationError::Transport(_) => "transport",
            GenerationError::InvalidResponse(_) => "invalid_response",
            GenerationError::NoImageProduced => "no_image_produced",
            GenerationError::NoVideoProduced => "no_video_produced",
            GenerationError::DownloadFailed(_) => "download_failed",
            GenerationError::AnalysisError(_) => "analysis_error",
            GenerationError::InvalidInput(_) => "invalid_input",
            GenerationError::Storage(_) => "storage",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            GenerationError::MissingCredential => {
                "API key missing. Save one with `archviz key set <KEY>` or export GEMINI_API_KEY."
                    .to_string()
            }
            GenerationError::Transient { .. } => {
                "The rendering engine is overloaded. Please try generating fewer images or wait a moment."
                    .to_string()
            }
            GenerationError::Remote { status, .. } if *status == 401 || *status == 403 || *status == 404 => {
                "API key error. Save a valid API key with `archviz key set <KEY>`.".to_string()
            }
            GenerationError::Remote { .. }
            | GenerationError::Transport(_)
            | GenerationError::InvalidResponse(_)
            | GenerationError::NoImageProduced => {
                "Generation failed. Please try again.".to_string()
            }
            GenerationError::NoVideoProduced => {
                "Video generation failed - no URI returned.".to_string()
            }
            GenerationError::DownloadFailed(_) => {
                "The generated video could not be downloaded.".to_string()
            }
            GenerationError::AnalysisError(_) => {
                "AI analysis is temporarily unavailable.".to_string()
            }
            GenerationError::InvalidInput(message) => message.clone(),
            GenerationError::Storage(message) => format!("Local storage unavailable: {message}"),
        }
    }
}

impl From<anyhow::Error> for GenerationError {
    fn from(err: anyhow::Error) -> Self {
        GenerationError::Storage(format!("{err:#}"))
    }
}
