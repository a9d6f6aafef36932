use nanobanana_contracts::models::{ModelFamily, ModelRegistry, ASPECT_RATIOS, DEFAULT_MODEL};

pub(crate) fn render_models() -> String {
    let registry = ModelRegistry::default();
    let mut gemini = String::new();
    let mut imagen = String::new();

    for spec in registry.list() {
        let marker = if spec.name == DEFAULT_MODEL {
            " (default)"
        } else {
            ""
        };
        let (section, pricing) = match spec.family {
            ModelFamily::Gemini { cost_per_token } => (
                &mut gemini,
                format!("~${:.0}/1M tokens", cost_per_token * 1_000_000.0),
            ),
            ModelFamily::Imagen { cost_per_image } => {
                (&mut imagen, format!("${cost_per_image:.2}/image"))
            }
        };
        section.push_str(&format!("  • {}{marker}\n", spec.name));
        section.push_str(&format!("    {}\n", spec.description));
        section.push_str(&format!("    Pricing: {pricing}\n"));
        if spec.max_reference_images.is_some() {
            section.push_str(&format!(
                "    Reference images: up to {}\n",
                spec.reference_image_limit()
            ));
        }
        if spec.has_variable_resolution() {
            let tiers = spec
                .resolution_tiers
                .iter()
                .map(|tier| tier.as_str())
                .collect::<Vec<&str>>()
                .join(", ");
            section.push_str(&format!("    Resolutions: {tiers}\n"));
        }
    }

    let mut out = String::new();
    if !gemini.is_empty() {
        out.push_str("Gemini Image Generation Models:\n");
        out.push_str(&gemini);
    }
    if !imagen.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("Imagen 4 Models:\n");
        out.push_str(&imagen);
    }
    out
}

pub(crate) fn render_aspect_ratios() -> String {
    let mut out = String::from("Available Aspect Ratios:\n");
    for spec in ASPECT_RATIOS {
        out.push_str(&format!(
            "  {:6} ({}x{:4}) - {}\n",
            spec.ratio, spec.width, spec.height, spec.description
        ));
    }
    out
}
