pub mod batch;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod media;
pub mod retry;
pub mod studio;
pub mod transport;

#[cfg(test)]
mod testing;

pub use batch::generate_batch;
pub use config::EngineConfig;
pub use credentials::{
    ambient_credential_from_env, Credential, CredentialResolver, CredentialSource,
    KeySelectionHost, NoKeySelectionHost, ResolvedCredential,
};
pub use error::GenerationError;
pub use gemini::{AnalysisResult, GeminiClient, ImageRequest, RemoteJob, VideoRequest};
pub use media::{ImageBytes, VideoBytes};
pub use retry::RetryPolicy;
pub use studio::{
    new_run_id, ArtifactOutput, ImageJob, Studio, VideoJob, VideoOutput, WorkflowOutput, MAX_BATCH,
};
pub use transport::{GeminiTransport, HttpTransport};
