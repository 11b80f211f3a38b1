use indexmap::IndexMap;

/// Quality tier of an image model. Resolutions above 1K route to `HighFidelity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Standard,
    HighFidelity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
    pub tier: Option<ModelTier>,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn by_tier(&self, capability: &str, tier: ModelTier) -> Option<ModelSpec> {
        self.models
            .values()
            .find(|model| model.supports(capability) && model.tier == Some(tier))
            .cloned()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, capabilities: &[&str], tier: Option<ModelTier>| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: "gemini".to_string(),
                capabilities: capabilities
                    .iter()
                    .map(|item| (*item).to_string())
                    .collect(),
                tier,
            },
        );
    };

    insert(
        "gemini-2.5-flash-image",
        &["image", "edit"],
        Some(ModelTier::Standard),
    );
    insert(
        "gemini-3-pro-image-preview",
        &["image", "edit"],
        Some(ModelTier::HighFidelity),
    );
    insert("gemini-3-pro-preview", &["text", "vision"], None);
    insert("veo-3.1-fast-generate-preview", &["video"], None);

    map
}
