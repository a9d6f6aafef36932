//! Turns a validated generation input into exactly one provider request.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nanobanana_contracts::models::{ModelFamily, ModelSpec, ResolutionTier};

use crate::client::wire::{
    Content, ContentRequest, GenerationConfig, ImageConfig, ImagesInstance, ImagesParameters,
    ImagesRequest, Part,
};
use crate::{Error, Result};

/// The two request shapes, one per pricing family.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Content(ContentRequest),
    Images(ImagesRequest),
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}

/// Reads a reference image into an inline part. Files are re-read here even
/// though validation already saw them, so a vanished file is a generation
/// failure rather than a validation one.
pub fn image_part_from_path(path: &Path) -> Result<Part> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => Error::generation(format!(
            "Reference image not found: {}. Ensure the file exists and the path is correct.",
            path.display()
        )),
        ErrorKind::PermissionDenied => Error::generation(format!(
            "Permission denied reading reference image: {}",
            path.display()
        )),
        _ => Error::generation(format!(
            "Failed to read reference image {}: {err}",
            path.display()
        )),
    })?;
    let mime = mime_for_path(path);
    log::debug!(
        "Loaded reference image {} ({mime}, {} bytes)",
        path.display(),
        bytes.len()
    );
    Ok(Part::image(mime, &bytes))
}

/// Image parts in input order, then the prompt text.
pub fn content_parts(prompt: &str, reference_images: &[PathBuf]) -> Result<Vec<Part>> {
    let mut parts = reference_images
        .iter()
        .map(|path| image_part_from_path(path))
        .collect::<Result<Vec<Part>>>()?;
    parts.push(Part::text(prompt));
    Ok(parts)
}

/// `resolution` must already be filtered through
/// [`validate_resolution`](crate::validation::validate_resolution).
pub fn build_generation_request(
    spec: &ModelSpec,
    prompt: &str,
    reference_images: &[PathBuf],
    aspect_ratio: &str,
    resolution: Option<ResolutionTier>,
) -> Result<GenerationRequest> {
    let image_size = resolution
        .filter(|tier| spec.supports_resolution(*tier))
        .map(|tier| tier.as_str().to_string());

    match spec.family {
        ModelFamily::Imagen { .. } => {
            if !reference_images.is_empty() {
                log::warn!(
                    "{} does not accept reference images; ignoring {} image(s)",
                    spec.name,
                    reference_images.len()
                );
            }
            Ok(GenerationRequest::Images(ImagesRequest {
                instances: vec![ImagesInstance {
                    prompt: prompt.to_string(),
                }],
                parameters: ImagesParameters {
                    sample_count: 1,
                    aspect_ratio: aspect_ratio.to_string(),
                    image_size,
                },
            }))
        }
        ModelFamily::Gemini { .. } => {
            let parts = content_parts(prompt, reference_images)?;
            Ok(GenerationRequest::Content(ContentRequest {
                contents: vec![Content::user(parts)],
                system_instruction: None,
                generation_config: GenerationConfig {
                    response_modalities: vec!["IMAGE".to_string()],
                    image_config: Some(ImageConfig {
                        aspect_ratio: aspect_ratio.to_string(),
                        image_size,
                    }),
                    ..GenerationConfig::default()
                },
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use nanobanana_contracts::models::{ModelRegistry, ResolutionTier};

    use super::{build_generation_request, content_parts, mime_for_path, GenerationRequest};
    use crate::client::wire::Part;
    use crate::Error;

    #[test]
    fn mime_for_path_defaults_to_jpeg() {
        assert_eq!(mime_for_path(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_for_path(Path::new("a.bmp")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "image/jpeg");
    }

    #[test]
    fn images_precede_prompt_text() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let first = temp.path().join("first.png");
        let second = temp.path().join("second.webp");
        fs::write(&first, b"one")?;
        fs::write(&second, b"two")?;

        let parts = content_parts("edit this", &[first, second])?;
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], Part::image("image/png", b"one"));
        assert_eq!(parts[1], Part::image("image/webp", b"two"));
        assert_eq!(parts[2], Part::text("edit this"));
        Ok(())
    }

    #[test]
    fn vanished_reference_is_a_generation_error() {
        let missing = PathBuf::from("/definitely/not/here.png");
        assert!(matches!(
            content_parts("x", &[missing]),
            Err(Error::Generation(message)) if message.contains("not found")
        ));
    }

    #[test]
    fn gemini_request_attaches_tier_only_when_supported() -> anyhow::Result<()> {
        let registry = ModelRegistry::default();
        let pro = registry
            .get("gemini-3-pro-image-preview")
            .ok_or_else(|| anyhow::anyhow!("missing pro model"))?;
        let flash = registry
            .get("gemini-2.5-flash-image")
            .ok_or_else(|| anyhow::anyhow!("missing flash model"))?;

        let GenerationRequest::Content(request) =
            build_generation_request(pro, "cat", &[], "16:9", Some(ResolutionTier::FourK))?
        else {
            anyhow::bail!("expected content request");
        };
        let config = request
            .generation_config
            .image_config
            .ok_or_else(|| anyhow::anyhow!("missing image config"))?;
        assert_eq!(config.aspect_ratio, "16:9");
        assert_eq!(config.image_size.as_deref(), Some("4K"));
        assert_eq!(
            request.generation_config.response_modalities,
            vec!["IMAGE".to_string()]
        );

        let GenerationRequest::Content(request) =
            build_generation_request(flash, "cat", &[], "1:1", Some(ResolutionTier::TwoK))?
        else {
            anyhow::bail!("expected content request");
        };
        assert_eq!(
            request
                .generation_config
                .image_config
                .and_then(|config| config.image_size),
            None
        );
        Ok(())
    }

    #[test]
    fn imagen_request_drops_reference_images() -> anyhow::Result<()> {
        let registry = ModelRegistry::default();
        let imagen = registry
            .get("imagen-4.0-generate-001")
            .ok_or_else(|| anyhow::anyhow!("missing imagen model"))?;
        let refs = vec![PathBuf::from("/does/not/matter.png")];

        let GenerationRequest::Images(request) =
            build_generation_request(imagen, "a lighthouse", &refs, "4:3", Some(ResolutionTier::TwoK))?
        else {
            anyhow::bail!("expected images request");
        };
        assert_eq!(request.instances.len(), 1);
        assert_eq!(request.instances[0].prompt, "a lighthouse");
        assert_eq!(request.parameters.sample_count, 1);
        assert_eq!(request.parameters.aspect_ratio, "4:3");
        assert_eq!(request.parameters.image_size.as_deref(), Some("2K"));
        Ok(())
    }
}
