use std::path::PathBuf;

use nanobanana_contracts::models::{format_resolution, ModelFamily, ModelRegistry, ResolutionTier};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::client::GenAiClient;
use crate::request::{build_generation_request, GenerationRequest};
use crate::response::{
    extract_content_image, extract_imagen_image, round_cost, save_image, token_cost,
};
use crate::validation::{validate_model, validate_resolution};
use crate::{Error, Result};

/// One image to generate. Inputs are expected to have passed validation;
/// only the model lookup and resolution filtering happen again here.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub output_path: PathBuf,
    pub reference_images: Vec<PathBuf>,
    pub aspect_ratio: String,
    pub model: String,
    pub resolution: Option<ResolutionTier>,
}

/// Exactly one of `token_count`/`estimated_cost_usd` or
/// `estimated_cost_per_image_usd` is populated, depending on the model family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub output_path: PathBuf,
    pub model: String,
    pub aspect_ratio: String,
    /// Baseline pixel size for the aspect ratio, never scaled by the tier.
    pub resolution: String,
    pub resolution_quality: Option<ResolutionTier>,
    pub reference_image_count: usize,
    pub token_count: Option<u64>,
    pub estimated_cost_usd: Option<f64>,
    pub estimated_cost_per_image_usd: Option<f64>,
    pub metadata: Map<String, Value>,
}

/// Builds the request, makes a single remote call and writes the image.
pub fn generate_image(client: &dyn GenAiClient, request: &ImageRequest) -> Result<GenerationResult> {
    validate_model(&request.model)?;
    let registry = ModelRegistry::default();
    let spec = registry
        .get(&request.model)
        .ok_or_else(|| Error::validation(format!("Unsupported model: {}", request.model)))?;
    let resolution = validate_resolution(request.resolution, &request.model);

    log::info!(
        "Generating image with {} ({}, aspect ratio {})",
        spec.name,
        spec.family.label(),
        request.aspect_ratio
    );

    let outbound = build_generation_request(
        spec,
        &request.prompt,
        &request.reference_images,
        &request.aspect_ratio,
        resolution,
    )?;

    let base = GenerationResult {
        output_path: request.output_path.clone(),
        model: request.model.clone(),
        aspect_ratio: request.aspect_ratio.clone(),
        resolution: format_resolution(&request.aspect_ratio),
        resolution_quality: resolution,
        reference_image_count: 0,
        token_count: None,
        estimated_cost_usd: None,
        estimated_cost_per_image_usd: None,
        metadata: Map::new(),
    };

    match (spec.family, outbound) {
        (ModelFamily::Gemini { cost_per_token }, GenerationRequest::Content(payload)) => {
            let response = client
                .generate_content(&request.model, &payload)
                .map_err(|err| {
                    Error::generation(format!(
                        "Image generation failed: {err:#}. \
                         Check your API key, network connection, and input parameters."
                    ))
                })?;
            let image = extract_content_image(&response)?;
            save_image(&request.output_path, &image.bytes)?;
            log::debug!("Token usage: {}", image.token_count);

            let mut metadata = Map::new();
            metadata.insert("model_type".to_string(), json!("gemini"));
            metadata.insert(
                "finish_reason".to_string(),
                json!(image.finish_reason.as_deref().unwrap_or("UNKNOWN")),
            );
            metadata.insert(
                "safety_ratings".to_string(),
                image.safety_ratings.unwrap_or(Value::Null),
            );

            Ok(GenerationResult {
                reference_image_count: request.reference_images.len(),
                token_count: Some(image.token_count),
                estimated_cost_usd: Some(token_cost(image.token_count, cost_per_token)),
                metadata,
                ..base
            })
        }
        (ModelFamily::Imagen { cost_per_image }, GenerationRequest::Images(payload)) => {
            let response = client
                .generate_images(&request.model, &payload)
                .map_err(|err| Error::generation(format!("Imagen generation failed: {err:#}")))?;
            let (bytes, mime_type) = extract_imagen_image(&response)?;
            save_image(&request.output_path, &bytes)?;

            let mut metadata = Map::new();
            metadata.insert("model_type".to_string(), json!("imagen"));
            metadata.insert(
                "mime_type".to_string(),
                mime_type.map(Value::String).unwrap_or(Value::Null),
            );

            Ok(GenerationResult {
                estimated_cost_per_image_usd: Some(round_cost(cost_per_image)),
                metadata,
                ..base
            })
        }
        (family, _) => Err(Error::generation(format!(
            "Request shape does not match the {} model family",
            family.label()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use base64::Engine as _;
    use nanobanana_contracts::models::ResolutionTier;
    use serde_json::json;

    use super::{generate_image, ImageRequest};
    use crate::client::fake::{FakeClient, RecordedCall};
    use crate::client::wire::{ContentResponse, ImagesResponse};
    use crate::Error;

    fn encoded(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn gemini_response(tokens: u64) -> anyhow::Result<ContentResponse> {
        Ok(serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": encoded(b"gemini")}}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": tokens}
        }))?)
    }

    fn imagen_response() -> anyhow::Result<ImagesResponse> {
        Ok(serde_json::from_value(json!({
            "predictions": [{"bytesBase64Encoded": encoded(b"imagen"), "mimeType": "image/png"}]
        }))?)
    }

    fn request(dir: &std::path::Path, model: &str) -> ImageRequest {
        ImageRequest {
            prompt: "a red fox in snow".to_string(),
            output_path: dir.join("out").join("fox.png"),
            reference_images: Vec::new(),
            aspect_ratio: "16:9".to_string(),
            model: model.to_string(),
            resolution: None,
        }
    }

    #[test]
    fn gemini_result_is_token_priced() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let client = FakeClient::with_content(gemini_response(1000)?);
        let result = generate_image(&client, &request(temp.path(), "gemini-2.5-flash-image"))?;

        assert_eq!(fs::read(&result.output_path)?, b"gemini");
        assert_eq!(result.resolution, "1344x768");
        assert_eq!(result.token_count, Some(1000));
        assert_eq!(result.estimated_cost_usd, Some(0.03));
        assert_eq!(result.estimated_cost_per_image_usd, None);
        assert_eq!(result.resolution_quality, None);
        assert_eq!(result.metadata.get("model_type"), Some(&json!("gemini")));
        assert_eq!(result.metadata.get("finish_reason"), Some(&json!("STOP")));
        assert_eq!(client.calls().len(), 1);
        Ok(())
    }

    #[test]
    fn imagen_result_is_image_priced() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let client = FakeClient::with_images(imagen_response()?);
        let mut req = request(temp.path(), "imagen-4.0-ultra-generate-001");
        req.resolution = Some(ResolutionTier::TwoK);
        let result = generate_image(&client, &req)?;

        assert_eq!(fs::read(&result.output_path)?, b"imagen");
        assert_eq!(result.token_count, None);
        assert_eq!(result.estimated_cost_usd, None);
        assert_eq!(result.estimated_cost_per_image_usd, Some(0.06));
        assert_eq!(result.resolution_quality, Some(ResolutionTier::TwoK));
        assert_eq!(result.resolution, "1344x768");
        assert_eq!(result.metadata.get("model_type"), Some(&json!("imagen")));
        Ok(())
    }

    #[test]
    fn unsupported_tier_is_dropped_from_request_and_result() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let client = FakeClient::with_images(imagen_response()?);
        let mut req = request(temp.path(), "imagen-4.0-fast-generate-001");
        req.resolution = Some(ResolutionTier::FourK);
        let result = generate_image(&client, &req)?;

        assert_eq!(result.resolution_quality, None);
        let calls = client.calls();
        let Some(RecordedCall::Images { request, .. }) = calls.first() else {
            anyhow::bail!("expected an images call");
        };
        assert_eq!(request.parameters.image_size, None);
        Ok(())
    }

    #[test]
    fn reference_images_are_sent_before_prompt() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let reference = temp.path().join("ref.png");
        fs::write(&reference, b"ref")?;
        let client = FakeClient::with_content(gemini_response(10)?);
        let mut req = request(temp.path(), "gemini-2.5-flash-image");
        req.reference_images = vec![reference];
        let result = generate_image(&client, &req)?;

        assert_eq!(result.reference_image_count, 1);
        let calls = client.calls();
        let Some(RecordedCall::Content { request, .. }) = calls.first() else {
            anyhow::bail!("expected a content call");
        };
        assert_eq!(request.contents[0].parts.len(), 2);
        Ok(())
    }

    #[test]
    fn remote_failure_is_wrapped_with_hint() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let client = FakeClient::failing("connection refused");
        let err = generate_image(&client, &request(temp.path(), "gemini-2.5-flash-image"))
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected failure"))?;
        assert!(matches!(err, Error::Generation(_)));
        let message = err.to_string();
        assert!(message.starts_with("Image generation failed: connection refused"));
        assert!(message.contains("Check your API key"));

        let err = generate_image(&client, &request(temp.path(), "imagen-4.0-generate-001"))
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert_eq!(err, "Imagen generation failed: connection refused");
        Ok(())
    }

    #[test]
    fn typed_extraction_errors_propagate_unchanged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let client = FakeClient::with_content(ContentResponse::default());
        let err = generate_image(&client, &request(temp.path(), "gemini-2.5-flash-image"))
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert_eq!(
            err,
            "No candidates returned from API. Request may have been blocked."
        );
        assert!(!temp.path().join("out").join("fox.png").exists());
        Ok(())
    }

    #[test]
    fn empty_image_payload_writes_nothing() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let response: ContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": ""}}
            ]}}]
        }))?;
        let client = FakeClient::with_content(response);
        let req = request(temp.path(), "gemini-2.5-flash-image");
        assert!(matches!(
            generate_image(&client, &req),
            Err(Error::Generation(message)) if message == "No image data available in response"
        ));
        assert!(!req.output_path.exists());
        Ok(())
    }

    #[test]
    fn unknown_model_fails_before_any_call() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let client = FakeClient::default();
        assert!(matches!(
            generate_image(&client, &request(temp.path(), "dall-e-3")),
            Err(Error::Validation(_))
        ));
        assert!(client.calls().is_empty());
        Ok(())
    }
}
