use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Key holding the user-supplied API key.
pub const MANUAL_API_KEY: &str = "gemini_api_key";
/// Key holding the render tab's history list.
pub const RENDER_HISTORY: &str = "archi_render_history";

/// String-keyed JSON store backed by a single file.
///
/// Reads refresh from disk so several instances over the same file observe each other's
/// writes. Writes merge only the keys this instance touched into the on-disk object.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    payload: Option<Map<String, Value>>,
    dirty_keys: Vec<String>,
    removed_keys: Vec<String>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            payload: None,
            dirty_keys: Vec::new(),
            removed_keys: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_value(&mut self, key: &str) -> Option<Value> {
        self.ensure_loaded().get(key).cloned()
    }

    pub fn get_string(&mut self, key: &str) -> Option<String> {
        self.ensure_loaded()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn set_value(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
        let payload = self.ensure_loaded();
        payload.insert(key.to_string(), value);
        self.removed_keys.retain(|existing| existing != key);
        if !self.dirty_keys.iter().any(|existing| existing == key) {
            self.dirty_keys.push(key.to_string());
        }
        self.flush()
    }

    pub fn set_string(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.set_value(key, Value::String(value.to_string()))
    }

    /// Deletes `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> anyhow::Result<bool> {
        let existed = self.ensure_loaded().remove(key).is_some();
        self.dirty_keys.retain(|existing| existing != key);
        if !self.removed_keys.iter().any(|existing| existing == key) {
            self.removed_keys.push(key.to_string());
        }
        self.flush()?;
        Ok(existed)
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        if self.payload.is_none() || (self.dirty_keys.is_empty() && self.removed_keys.is_empty())
        {
            return Ok(());
        }

        let mut on_disk = match read_json_object(&self.path) {
            Some(existing) => existing,
            None => {
                preserve_unreadable(&self.path)?;
                Map::new()
            }
        };
        if let Some(payload) = &self.payload {
            for key in &self.dirty_keys {
                if let Some(value) = payload.get(key) {
                    on_disk.insert(key.clone(), value.clone());
                }
            }
        }
        for key in &self.removed_keys {
            on_disk.remove(key);
        }
        write_json_object(&self.path, &on_disk)?;
        self.payload = Some(on_disk);
        self.dirty_keys.clear();
        self.removed_keys.clear();
        Ok(())
    }

    fn ensure_loaded(&mut self) -> &mut Map<String, Value> {
        self.payload
            .insert(read_json_object(&self.path).unwrap_or_default())
    }
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.as_object().cloned()
}

/// Copies an existing but unreadable store to `<name>.corrupt` before it gets overwritten.
fn preserve_unreadable(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".corrupt");
    let backup = PathBuf::from(backup);
    std::fs::copy(path, &backup)?;
    tracing::warn!(
        path = %path.display(),
        backup = %backup.display(),
        "store file unreadable; starting a fresh one"
    );
    Ok(())
}

fn write_json_object(path: &Path, payload: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        path,
        serde_json::to_string_pretty(&Value::Object(payload.clone()))?,
    )?;
    Ok(())
}
