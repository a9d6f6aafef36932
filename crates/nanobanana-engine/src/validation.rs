//! Input checks run before any remote call. All of them are pure apart from
//! logging and report failures as [`Error::Validation`]; none of them try to
//! correct the input.

use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

use nanobanana_contracts::models::{
    is_supported_aspect_ratio, ModelRegistry, ResolutionTier, ASPECT_RATIOS,
};

use crate::{Error, Result};

pub fn validate_aspect_ratio(aspect_ratio: &str) -> Result<()> {
    if is_supported_aspect_ratio(aspect_ratio) {
        return Ok(());
    }
    let supported = ASPECT_RATIOS
        .iter()
        .map(|spec| spec.ratio)
        .collect::<Vec<&str>>()
        .join(", ");
    Err(Error::validation(format!(
        "Unsupported aspect ratio: {aspect_ratio}. Supported ratios: {supported}. \
         Use 'nanobanana list-aspect-ratios' to see all options."
    )))
}

pub fn validate_model(model: &str) -> Result<()> {
    let registry = ModelRegistry::default();
    if registry.contains(model) {
        return Ok(());
    }
    Err(Error::validation(format!(
        "Unsupported model: {model}. Supported models: {}. \
         Use 'nanobanana list-models' to see all options.",
        registry.names().join(", ")
    )))
}

/// Count is checked before existence, so a too-long list fails even when
/// every path is valid.
pub fn validate_reference_images(image_paths: &[PathBuf], model: &str) -> Result<()> {
    let max_images = ModelRegistry::default().max_reference_images(model);
    log::debug!(
        "Validating {} reference images for model {model} (max={max_images})",
        image_paths.len()
    );

    if image_paths.len() > max_images {
        let provided = image_paths
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<String>>()
            .join(", ");
        return Err(Error::validation(format!(
            "Too many reference images: {}. Maximum allowed for {model} is {max_images}. \
             Provided: {provided}",
            image_paths.len()
        )));
    }

    for path in image_paths {
        if !path.exists() {
            return Err(Error::validation(format!(
                "Reference image not found: {}. Ensure the file exists and the path is correct.",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(Error::validation(format!(
                "Reference image path is not a file: {}",
                path.display()
            )));
        }
    }
    log::debug!("All reference images validated successfully");
    Ok(())
}

/// Returns the tier that will actually be sent. A tier the model cannot honour
/// is dropped with a warning rather than rejected.
pub fn validate_resolution(
    resolution: Option<ResolutionTier>,
    model: &str,
) -> Option<ResolutionTier> {
    let tier = resolution?;
    let registry = ModelRegistry::default();
    match registry.get(model) {
        Some(spec) if spec.supports_resolution(tier) => Some(tier),
        Some(spec) if spec.has_variable_resolution() => {
            log::warn!("Resolution {tier} is not supported by {model}; using the model default");
            None
        }
        _ => {
            log::warn!("Resolution parameter ignored: {model} renders at a fixed resolution");
            None
        }
    }
}

/// Loads the prompt from exactly one of: positional text, a file, or stdin.
pub fn load_prompt(text: Option<&str>, file: Option<&Path>, use_stdin: bool) -> Result<String> {
    load_prompt_from(text, file, use_stdin, &mut io::stdin())
}

pub fn load_prompt_from(
    text: Option<&str>,
    file: Option<&Path>,
    use_stdin: bool,
    stdin: &mut dyn Read,
) -> Result<String> {
    let provided = [text.is_some(), file.is_some(), use_stdin]
        .into_iter()
        .filter(|present| *present)
        .count();
    if provided == 0 {
        return Err(Error::validation(
            "No prompt provided. Use one of: PROMPT (positional), --prompt-file FILE, or --stdin",
        ));
    }
    if provided > 1 {
        return Err(Error::validation(
            "Multiple prompt sources provided. \
             Use only one of: PROMPT (positional), --prompt-file, or --stdin",
        ));
    }

    if let Some(text) = text {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(Error::validation("Prompt is empty"));
        }
        return Ok(prompt.to_string());
    }

    if let Some(file) = file {
        log::debug!("Loading prompt from file: {}", file.display());
        let raw = std::fs::read_to_string(file).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::validation(format!(
                "Prompt file not found: {}. Ensure the file exists and the path is correct.",
                file.display()
            )),
            ErrorKind::PermissionDenied => Error::validation(format!(
                "Permission denied reading prompt file: {}",
                file.display()
            )),
            _ => Error::validation(format!(
                "Failed to read prompt file {}: {err}",
                file.display()
            )),
        })?;
        let prompt = raw.trim();
        if prompt.is_empty() {
            return Err(Error::validation(format!(
                "Prompt file is empty: {}",
                file.display()
            )));
        }
        log::debug!("Prompt loaded from file: {} characters", prompt.len());
        return Ok(prompt.to_string());
    }

    log::debug!("Loading prompt from stdin");
    let mut raw = String::new();
    stdin
        .read_to_string(&mut raw)
        .map_err(|err| Error::validation(format!("Failed to read from stdin: {err}")))?;
    let prompt = raw.trim();
    if prompt.is_empty() {
        return Err(Error::validation(
            "No input received from stdin. Pipe content or use PROMPT or --prompt-file instead.",
        ));
    }
    Ok(prompt.to_string())
}
