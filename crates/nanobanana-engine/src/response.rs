//! Pulls image bytes and usage out of provider responses and writes them out.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

use crate::client::wire::{ContentResponse, ImagesResponse, InlinePayload};
use crate::{Error, Result};

/// Image pulled out of a `generateContent` response, with the bits of the
/// first candidate that end up in result metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImage {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
    pub finish_reason: Option<String>,
    pub safety_ratings: Option<Value>,
    pub token_count: u64,
}

pub fn extract_content_image(response: &ContentResponse) -> Result<ExtractedImage> {
    let candidate = response.candidates.first().ok_or_else(|| {
        Error::generation("No candidates returned from API. Request may have been blocked.")
    })?;

    let parts = candidate
        .content
        .as_ref()
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();
    if parts.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
        return Err(Error::generation(format!(
            "No content generated. Finish reason: {reason}. \
             The prompt may have been blocked by safety filters."
        )));
    }

    let blob = parts
        .iter()
        .find_map(|part| {
            part.inline_data
                .as_ref()
                .filter(|blob| blob.data.is_some())
        })
        .ok_or_else(|| {
            Error::generation(
                "No image data found in response. The model may have returned text only.",
            )
        })?;

    let bytes = match &blob.data {
        Some(InlinePayload::Encoded(text)) => decode_base64(text)?,
        Some(InlinePayload::Raw(bytes)) => bytes.clone(),
        None => Vec::new(),
    };
    if bytes.is_empty() {
        return Err(Error::generation("No image data available in response"));
    }

    let token_count = response
        .usage_metadata
        .as_ref()
        .and_then(|usage| usage.total_token_count)
        .unwrap_or(0);

    Ok(ExtractedImage {
        bytes,
        mime_type: blob.mime_type.clone(),
        finish_reason: candidate.finish_reason.clone(),
        safety_ratings: candidate.safety_ratings.clone(),
        token_count,
    })
}

/// First prediction of an Imagen `predict` response as `(bytes, mime_type)`.
pub fn extract_imagen_image(response: &ImagesResponse) -> Result<(Vec<u8>, Option<String>)> {
    let prediction = response
        .predictions
        .iter()
        .find(|prediction| {
            prediction
                .bytes_base64_encoded
                .as_deref()
                .is_some_and(|encoded| !encoded.trim().is_empty())
        })
        .ok_or_else(|| Error::generation("No images returned from Imagen API"))?;
    let encoded = prediction.bytes_base64_encoded.as_deref().unwrap_or_default();
    let bytes = decode_base64(encoded)?;
    Ok((bytes, prediction.mime_type.clone()))
}

fn decode_base64(text: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(text.trim().as_bytes())
        .map_err(|err| Error::generation(format!("Failed to decode image data: {err}")))
}

/// Write failures here are local problems, so they are validation errors.
pub fn save_image(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            Error::validation(format!(
                "Cannot create output directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    fs::write(path, bytes).map_err(|err| {
        Error::validation(format!("Cannot write output file {}: {err}", path.display()))
    })?;
    log::info!("Image saved to: {}", path.display());
    Ok(())
}

pub fn round_cost(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub fn token_cost(token_count: u64, cost_per_token: f64) -> f64 {
    if token_count == 0 {
        return 0.0;
    }
    round_cost(token_count as f64 * cost_per_token)
}
