mod aspect;
mod registry;
mod resolution;

pub use aspect::{
    aspect_ratio_dimensions, format_resolution, is_supported_aspect_ratio, AspectRatioSpec,
    ASPECT_RATIOS, DEFAULT_ASPECT_RATIO,
};
pub use registry::{
    is_imagen_model, text_model_cost_per_token, ModelFamily, ModelRegistry, ModelSpec,
    DEFAULT_MAX_REFERENCE_IMAGES, DEFAULT_MODEL, DEFAULT_TEXT_MODEL,
};
pub use resolution::ResolutionTier;
