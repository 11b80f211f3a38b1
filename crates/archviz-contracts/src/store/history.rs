use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::local::LocalStore;

/// A generated image or clip. On disk: `{id, url, prompt, timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub id: String,
    pub url: String,
    #[serde(rename = "prompt")]
    pub prompt_used: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub created_at: i64,
}

impl GeneratedArtifact {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        prompt_used: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            prompt_used: prompt_used.into(),
            created_at,
        }
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

/// Time-derived artifact id: `{millis}` for a single result, `{millis}-{index}` inside a batch.
pub fn artifact_id(stamp_millis: i64, batch_index: Option<usize>) -> String {
    match batch_index {
        Some(index) => format!("{stamp_millis}-{index}"),
        None => stamp_millis.to_string(),
    }
}

/// Most-recent-first list of artifacts persisted under one store key.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    store: LocalStore,
    key: String,
    entries: Vec<GeneratedArtifact>,
}

impl HistoryStore {
    pub fn open(mut store: LocalStore, key: impl Into<String>) -> Self {
        let key = key.into();
        let entries = match store.get_value(&key) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_value::<Vec<GeneratedArtifact>>(raw) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "ignoring unreadable history");
                    Vec::new()
                }
            },
        };
        Self {
            store,
            key,
            entries,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn list(&self) -> &[GeneratedArtifact] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&GeneratedArtifact> {
        self.entries.iter().find(|artifact| artifact.id == id)
    }

    pub fn append(&mut self, artifact: GeneratedArtifact) -> anyhow::Result<()> {
        self.append_batch(vec![artifact])
    }

    /// Prepends a batch in submission order with a single write.
    pub fn append_batch(&mut self, artifacts: Vec<GeneratedArtifact>) -> anyhow::Result<()> {
        if artifacts.is_empty() {
            return Ok(());
        }
        let mut next = artifacts;
        next.append(&mut self.entries);
        self.entries = next;
        self.persist()
    }

    /// Moves an existing artifact to the front without duplicating it.
    pub fn select(&mut self, id: &str) -> anyhow::Result<Option<GeneratedArtifact>> {
        let Some(position) = self.entries.iter().position(|artifact| artifact.id == id) else {
            return Ok(None);
        };
        let artifact = self.entries.remove(position);
        self.entries.insert(0, artifact.clone());
        if position != 0 {
            self.persist()?;
        }
        Ok(Some(artifact))
    }

    /// Empties the list and deletes the persisted entry.
    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.entries.clear();
        self.store.remove(&self.key)?;
        Ok(())
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        let value = serde_json::to_value(&self.entries)?;
        self.store.set_value(&self.key, value)
    }
}

impl From<&GeneratedArtifact> for Value {
    fn from(artifact: &GeneratedArtifact) -> Self {
        serde_json::to_value(artifact).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn artifact(id: &str) -> GeneratedArtifact {
        GeneratedArtifact::new(id, format!("file:///tmp/{id}.png"), "prompt", 1_700_000_000_000)
    }

    fn open(path: &std::path::Path) -> HistoryStore {
        HistoryStore::open(LocalStore::new(path), "archi_render_history")
    }

    #[test]
    fn newest_artifact_first() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut history = open(&temp.path().join("store.json"));
        history.append(artifact("a"))?;
        history.append(artifact("b"))?;
        let ids: Vec<&str> = history.list().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        Ok(())
    }

    #[test]
    fn clear_removes_persisted_entry() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut history = open(&path);
        history.append(artifact("a"))?;
        history.clear()?;
        assert!(history.list().is_empty());

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert!(raw.get("archi_render_history").is_none());
        assert!(open(&path).is_empty());
        Ok(())
    }

    #[test]
    fn batch_is_prepended_in_submission_order() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut history = open(&path);
        history.append(artifact("old"))?;
        history.append_batch(vec![artifact("n-0"), artifact("n-1")])?;

        let reloaded = open(&path);
        let ids: Vec<&str> = reloaded.list().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["n-0", "n-1", "old"]);
        Ok(())
    }

    #[test]
    fn select_moves_to_front_without_duplicates() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut history = open(&path);
        for id in ["a", "b", "c"] {
            history.append(artifact(id))?;
        }
        let selected = history.select("a")?;
        assert_eq!(selected.map(|a| a.id), Some("a".to_string()));
        let ids: Vec<String> = open(&path).list().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(history.select("missing")?, None);
        assert_eq!(history.len(), 3);
        Ok(())
    }

    #[test]
    fn persisted_format_uses_short_field_names() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut history = open(&path);
        history.append(artifact("a"))?;
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(
            raw["archi_render_history"][0],
            json!({
                "id": "a",
                "url": "file:///tmp/a.png",
                "prompt": "prompt",
                "timestamp": 1_700_000_000_000i64,
            })
        );
        Ok(())
    }

    #[test]
    fn unreadable_history_loads_empty() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut store = LocalStore::new(&path);
        store.set_value("archi_render_history", json!({"not": "a list"}))?;
        assert!(open(&path).is_empty());
        Ok(())
    }

    #[test]
    fn artifact_ids_are_time_derived() {
        assert_eq!(artifact_id(1700, None), "1700");
        assert_eq!(artifact_id(1700, Some(2)), "1700-2");
    }
}
