mod params;
mod registry;
mod selectors;

pub use params::{AspectRatio, ParamError, Resolution, VideoAspectRatio};
pub use registry::{ModelRegistry, ModelSpec, ModelTier};
pub use selectors::{ImagePlan, ModelSelection, ModelSelector};
