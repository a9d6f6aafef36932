use indexmap::IndexMap;

use super::resolution::ResolutionTier;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_REFERENCE_IMAGES: usize = 3;

const TEXT_MODEL_COST_PER_TOKEN: [(&str, f64); 3] = [
    ("gemini-2.5-flash", 0.000_002_5),
    ("gemini-2.0-flash-exp", 0.000_000_4),
    ("gemini-3-pro-preview", 0.000_012),
];

/// Billing family of an image model. Each family has its own request shape
/// and populates a different set of cost fields in the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelFamily {
    Gemini { cost_per_token: f64 },
    Imagen { cost_per_image: f64 },
}

impl ModelFamily {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gemini { .. } => "gemini",
            Self::Imagen { .. } => "imagen",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub description: String,
    pub family: ModelFamily,
    pub max_reference_images: Option<usize>,
    pub resolution_tiers: Vec<ResolutionTier>,
}

impl ModelSpec {
    pub fn supports_resolution(&self, tier: ResolutionTier) -> bool {
        self.resolution_tiers.contains(&tier)
    }

    pub fn has_variable_resolution(&self) -> bool {
        !self.resolution_tiers.is_empty()
    }

    pub fn reference_image_limit(&self) -> usize {
        self.max_reference_images
            .unwrap_or(DEFAULT_MAX_REFERENCE_IMAGES)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
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

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    /// Reference image limit for `name`, falling back to the default for
    /// models that do not declare one.
    pub fn max_reference_images(&self, name: &str) -> usize {
        self.get(name)
            .map(ModelSpec::reference_image_limit)
            .unwrap_or(DEFAULT_MAX_REFERENCE_IMAGES)
    }
}

pub fn is_imagen_model(name: &str) -> bool {
    name.starts_with("imagen-")
}

pub fn text_model_cost_per_token(model: &str) -> f64 {
    TEXT_MODEL_COST_PER_TOKEN
        .iter()
        .find(|(name, _)| *name == model)
        .or_else(|| {
            TEXT_MODEL_COST_PER_TOKEN
                .iter()
                .find(|(name, _)| *name == DEFAULT_TEXT_MODEL)
        })
        .map(|(_, cost)| *cost)
        .unwrap_or(0.0)
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str,
                      description: &str,
                      family: ModelFamily,
                      max_reference_images: Option<usize>,
                      resolution_tiers: &[ResolutionTier]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                description: description.to_string(),
                family,
                max_reference_images,
                resolution_tiers: resolution_tiers.to_vec(),
            },
        );
    };

    insert(
        "gemini-2.5-flash-image",
        "Fast, high-quality image generation (default)",
        ModelFamily::Gemini {
            cost_per_token: 0.000_03,
        },
        Some(3),
        &[],
    );
    insert(
        "gemini-3-pro-image-preview",
        "Professional quality, 1K/2K/4K output, up to 14 reference images",
        ModelFamily::Gemini {
            cost_per_token: 0.000_12,
        },
        Some(14),
        &ResolutionTier::ALL,
    );
    insert(
        "imagen-4.0-generate-001",
        "Imagen 4 standard, balanced quality and speed",
        ModelFamily::Imagen {
            cost_per_image: 0.04,
        },
        None,
        &[ResolutionTier::OneK, ResolutionTier::TwoK],
    );
    insert(
        "imagen-4.0-ultra-generate-001",
        "Imagen 4 Ultra, highest prompt fidelity",
        ModelFamily::Imagen {
            cost_per_image: 0.06,
        },
        None,
        &[ResolutionTier::OneK, ResolutionTier::TwoK],
    );
    insert(
        "imagen-4.0-fast-generate-001",
        "Imagen 4 Fast, lowest latency and cost",
        ModelFamily::Imagen {
            cost_per_image: 0.02,
        },
        None,
        &[],
    );

    map
}
