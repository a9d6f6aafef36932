use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prompt-enhancement categories. Declaration order is also the priority
/// order used to break ties during keyword detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptTemplate {
    Photography,
    Character,
    Scene,
    Food,
    Abstract,
    Logo,
}

impl PromptTemplate {
    pub const ALL: [PromptTemplate; 6] = [
        Self::Photography,
        Self::Character,
        Self::Scene,
        Self::Food,
        Self::Abstract,
        Self::Logo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photography => "photography",
            Self::Character => "character",
            Self::Scene => "scene",
            Self::Food => "food",
            Self::Abstract => "abstract",
            Self::Logo => "logo",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Photography => {
                "Professional photography with camera, lighting, and technical details"
            }
            Self::Character => "Character design with pose, attire, and style specifications",
            Self::Scene => "Scene composition with foreground, midground, background layers",
            Self::Food => "Food photography with plating, lighting, and presentation details",
            Self::Abstract => "Abstract art with shapes, colors, and composition style",
            Self::Logo => "Logo design with typography, shapes, and branding elements",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Photography => &[
                "photo",
                "photograph",
                "portrait",
                "landscape",
                "macro",
                "shot",
                "camera",
            ],
            Self::Character => &[
                "character",
                "person",
                "hero",
                "villain",
                "avatar",
                "portrait",
                "figure",
            ],
            Self::Scene => &[
                "scene",
                "environment",
                "landscape",
                "cityscape",
                "interior",
                "setting",
                "location",
            ],
            Self::Food => &[
                "food", "dish", "meal", "cuisine", "plate", "dessert", "recipe",
            ],
            Self::Abstract => &[
                "abstract",
                "geometric",
                "pattern",
                "composition",
                "shapes",
                "design",
            ],
            Self::Logo => &["logo", "brand", "icon", "emblem", "symbol", "wordmark"],
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            Self::Photography => PHOTOGRAPHY_INSTRUCTIONS,
            Self::Character => CHARACTER_INSTRUCTIONS,
            Self::Scene => SCENE_INSTRUCTIONS,
            Self::Food => FOOD_INSTRUCTIONS,
            Self::Abstract => ABSTRACT_INSTRUCTIONS,
            Self::Logo => LOGO_INSTRUCTIONS,
        }
    }

    fn keyword_score(&self, lowered: &str) -> usize {
        self.keywords()
            .iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count()
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptTemplate {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|template| template.as_str() == lowered)
            .ok_or_else(|| {
                let available = Self::ALL
                    .iter()
                    .map(PromptTemplate::as_str)
                    .collect::<Vec<&str>>()
                    .join(", ");
                format!("Unknown template: {raw}. Available templates: {available}")
            })
    }
}

/// Picks the category whose keywords occur most often in `description`
/// (case-insensitive substring match). Ties go to the earlier category in
/// [`PromptTemplate::ALL`]; no match at all yields `None`.
pub fn detect_category(description: &str) -> Option<PromptTemplate> {
    let lowered = description.to_lowercase();
    let mut best: Option<(PromptTemplate, usize)> = None;
    for template in PromptTemplate::ALL {
        let score = template.keyword_score(&lowered);
        if score == 0 {
            continue;
        }
        if best.map(|(_, top)| score > top).unwrap_or(true) {
            best = Some((template, score));
        }
    }
    best.map(|(template, _)| template)
}

const PHOTOGRAPHY_INSTRUCTIONS: &str = "Transform this into a professional photography prompt with:
- Photographic style (portrait, landscape, macro, etc.)
- Camera/lens details (if relevant)
- Lighting description (natural, studio, golden hour, etc.)
- Depth of field and focus details
- Technical quality indicators (sharp, detailed, high resolution)
- Mood and atmosphere
- Background and setting

Example format: \"Professional [style] photography of [subject], shot with [lens details],
[lighting description], [depth of field], [mood/atmosphere], [technical quality]\"
";

const CHARACTER_INSTRUCTIONS: &str = "Transform this into a character design prompt with:
- Character description (physical features, expression)
- Clothing and accessories details
- Art style (anime, realistic, cartoon, concept art, etc.)
- Pose and viewpoint (front view, three-quarter, full body, etc.)
- Setting or background context
- Color palette and mood
- Technical details (clean lines, detailed rendering, etc.)

Example format: \"[Art style] character design of [description], wearing [clothing],
[pose/viewpoint], [setting], [color palette], [technical details]\"
";

const SCENE_INSTRUCTIONS: &str = "Transform this into a scene composition prompt with:
- Scene overview and main subject
- Foreground elements (what's closest to viewer)
- Midground elements (middle distance)
- Background elements (distant/backdrop)
- Lighting and atmosphere (time of day, weather, mood)
- Perspective and composition (wide angle, aerial view, etc.)
- Style and technical quality

Example format: \"[Style] scene composition: [main subject],
Foreground: [elements], Midground: [elements], Background: [elements],
[lighting/atmosphere], [perspective], [technical details]\"
";

const FOOD_INSTRUCTIONS: &str = "Transform this into a food photography prompt with:
- Dish description and ingredients
- Plating style (minimalist, elaborate, rustic, etc.)
- Serving presentation (plate type, garnishes, accompaniments)
- Lighting (natural window light, soft studio, dramatic, etc.)
- Camera angle (overhead, 45-degree, close-up, etc.)
- Background and setting (restaurant, kitchen, table setting)
- Mood and atmosphere (elegant, casual, vibrant, etc.)
- Technical quality (sharp focus, shallow depth of field, etc.)

Example format: \"Professional food photography of [dish], [plating style],
[camera angle], [lighting], [background/setting], [mood], [technical details]\"
";

const ABSTRACT_INSTRUCTIONS: &str = "Transform this into an abstract art prompt with:
- Concept or theme
- Geometric shapes or organic forms
- Color palette (bold, pastel, monochrome, etc.)
- Composition style (symmetrical, dynamic, minimalist, etc.)
- Art movement or style (modernist, surrealist, minimalist, etc.)
- Texture and patterns
- Mood and emotional impact

Example format: \"Abstract [style] composition featuring [concept],
[shapes/forms], [color palette], [composition style], [texture/patterns],
[mood/atmosphere]\"
";

const LOGO_INSTRUCTIONS: &str = "Transform this into a logo design prompt with:
- Brand name or text (if applicable)
- Logo type (wordmark, symbol, combination, etc.)
- Design style (modern, minimalist, vintage, tech, organic, etc.)
- Geometric elements or shapes
- Color scheme and contrast
- Typography style (if text is included)
- Use case or purpose (app icon, business card, signage, etc.)
- Technical requirements (scalable, high contrast, clean lines)

Example format: \"Logo design for [brand/purpose], [logo type], [design style],
featuring [elements], [color scheme], [typography], [technical requirements]\"
";
