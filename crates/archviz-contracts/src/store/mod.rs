mod history;
mod local;

pub use history::{artifact_id, GeneratedArtifact, HistoryStore};
pub use local::{LocalStore, MANUAL_API_KEY, RENDER_HISTORY};
