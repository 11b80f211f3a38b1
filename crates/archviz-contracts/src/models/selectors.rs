use super::params::Resolution;
use super::registry::{ModelRegistry, ModelSpec, ModelTier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

/// Model, `imageSize` and prompt prefix for one image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlan {
    pub model: ModelSpec,
    pub image_size: Option<String>,
    pub prompt_prefix: Option<String>,
}

impl ImagePlan {
    pub fn apply_prefix(&self, prompt: &str) -> String {
        match &self.prompt_prefix {
            Some(prefix) => format!("{prefix}{prompt}"),
            None => prompt.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_else(|| ModelRegistry::new(None)),
        }
    }

    pub fn image_plan(&self, resolution: Resolution) -> Result<ImagePlan, String> {
        let tier = if resolution.is_high_fidelity() {
            ModelTier::HighFidelity
        } else {
            ModelTier::Standard
        };
        let Some(model) = self.registry.by_tier("image", tier) else {
            return Err(format!(
                "No image model registered for the {tier:?} tier."
            ));
        };
        let prompt_prefix = resolution.is_high_fidelity().then(|| {
            format!(
                "[ULTRA HIGH FIDELITY ARCHITECTURAL RENDER - {} OUTPUT]: ",
                resolution.as_str()
            )
        });
        Ok(ImagePlan {
            model,
            image_size: resolution.request_image_size().map(str::to_string),
            prompt_prefix,
        })
    }

    pub fn select(
        &self,
        requested: Option<&str>,
        capability: &str,
    ) -> Result<ModelSelection, String> {
        let (fallback_reason, requested_text) = if let Some(requested_value) = requested {
            if let Some(model) = self.registry.ensure(requested_value, capability) {
                return Ok(ModelSelection {
                    model,
                    requested: Some(requested_value.to_string()),
                    fallback_reason: None,
                });
            }
            (
                Some(format!(
                    "Requested model '{requested_value}' unavailable for capability '{capability}'."
                )),
                Some(requested_value.to_string()),
            )
        } else {
            (None, None)
        };

        let candidates = self.registry.by_capability(capability);
        let Some(model) = candidates.first().cloned() else {
            return Err(format!(
                "No models available for capability '{capability}'."
            ));
        };
        Ok(ModelSelection {
            model,
            requested: requested_text,
            fallback_reason,
        })
    }
}
