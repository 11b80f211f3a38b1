use std::fmt;

use archviz_contracts::store::{LocalStore, MANUAL_API_KEY};

use crate::config::non_empty_env;
use crate::error::GenerationError;

/// API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        let tail: String = self
            .0
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if self.0.chars().count() <= 8 {
            "***".to_string()
        } else {
            format!("***{tail}")
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Manual,
    Host,
    Ambient,
}

impl CredentialSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialSource::Manual => "manual",
            CredentialSource::Host => "host",
            CredentialSource::Ambient => "environment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub credential: Credential,
    pub source: CredentialSource,
}

/// Interactive key picker offered by the embedding host.
pub trait KeySelectionHost: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    fn has_selected_key(&self) -> anyhow::Result<bool>;

    /// Blocks until the user has picked a key or dismissed the picker.
    fn open_key_selection(&self) -> anyhow::Result<()>;

    /// Key chosen through the picker, when the host hands it over directly.
    fn selected_key(&self) -> Option<Credential> {
        None
    }
}

/// Host without a key picker.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKeySelectionHost;

impl KeySelectionHost for NoKeySelectionHost {
    fn is_available(&self) -> bool {
        false
    }

    fn has_selected_key(&self) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn open_key_selection(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Ambient key from `API_KEY`, `GEMINI_API_KEY` or `GOOGLE_API_KEY`, first non-empty wins.
pub fn ambient_credential_from_env() -> Option<Credential> {
    non_empty_env("API_KEY")
        .or_else(|| non_empty_env("GEMINI_API_KEY"))
        .or_else(|| non_empty_env("GOOGLE_API_KEY"))
        .and_then(|value| Credential::new(&value))
}

/// Picks the key for the next remote call.
///
/// Precedence: manually saved key, then the host picker, then the ambient key. The picker
/// is only opened when no manual key exists.
pub struct CredentialResolver {
    store: LocalStore,
    host: Box<dyn KeySelectionHost>,
    ambient: Option<Credential>,
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("store", &self.store.path())
            .field("host_available", &self.host.is_available())
            .field("ambient", &self.ambient)
            .finish()
    }
}

impl CredentialResolver {
    pub fn new(
        store: LocalStore,
        host: Box<dyn KeySelectionHost>,
        ambient: Option<Credential>,
    ) -> Self {
        Self {
            store,
            host,
            ambient,
        }
    }

    pub fn from_env(store: LocalStore, host: Box<dyn KeySelectionHost>) -> Self {
        Self::new(store, host, ambient_credential_from_env())
    }

    pub fn manual(&mut self) -> Option<Credential> {
        self.store
            .get_string(MANUAL_API_KEY)
            .and_then(|value| Credential::new(&value))
    }

    pub fn resolve(&mut self) -> Result<ResolvedCredential, GenerationError> {
        if let Some(credential) = self.manual() {
            return Ok(ResolvedCredential {
                credential,
                source: CredentialSource::Manual,
            });
        }

        if self.host.is_available() {
            if let Some(credential) = self.resolve_through_host() {
                return Ok(ResolvedCredential {
                    credential,
                    source: CredentialSource::Host,
                });
            }
        }

        match self.ambient.clone() {
            Some(credential) => Ok(ResolvedCredential {
                credential,
                source: CredentialSource::Ambient,
            }),
            None => Err(GenerationError::MissingCredential),
        }
    }

    fn resolve_through_host(&self) -> Option<Credential> {
        let selected = match self.host.has_selected_key() {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!("no key selected, opening key picker");
                if let Err(err) = self.host.open_key_selection() {
                    tracing::warn!(error = %err, "key picker failed");
                }
                self.host.has_selected_key().unwrap_or(false)
            }
            Err(err) => {
                tracing::warn!(error = %err, "key selection state unavailable");
                false
            }
        };
        if selected {
            self.host.selected_key()
        } else {
            None
        }
    }

    /// Non-interactive view of where the next key would come from.
    pub fn status(&mut self) -> Option<CredentialSource> {
        if self.manual().is_some() {
            return Some(CredentialSource::Manual);
        }
        if self.host.is_available()
            && self.host.has_selected_key().unwrap_or(false)
            && self.host.selected_key().is_some()
        {
            return Some(CredentialSource::Host);
        }
        self.ambient.as_ref().map(|_| CredentialSource::Ambient)
    }

    pub fn set_manual(&mut self, raw: &str) -> Result<Credential, GenerationError> {
        let credential = Credential::new(raw).ok_or_else(|| {
            GenerationError::InvalidInput("Please enter a valid API key.".to_string())
        })?;
        self.store.set_string(MANUAL_API_KEY, credential.expose())?;
        Ok(credential)
    }

    pub fn clear_manual(&mut self) -> Result<bool, GenerationError> {
        Ok(self.store.remove(MANUAL_API_KEY)?)
    }
}
