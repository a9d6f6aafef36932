use anyhow::Result;
use nanobanana_contracts::models::format_resolution;
use nanobanana_engine::session::ConversationSession;
use nanobanana_engine::validation::{
    load_prompt, validate_aspect_ratio, validate_model, validate_reference_images,
};
use nanobanana_engine::{generate_image, generate_prompt, ImageRequest, PromptGenResult, PromptRequest};
use serde_json::{json, Value};

use crate::{ConversationArgs, GenerateArgs};

pub(crate) fn run_generate(args: GenerateArgs) -> Result<()> {
    log::info!("Output file: {}", args.output.display());
    log::debug!("Aspect ratio: {}", args.aspect_ratio);
    log::debug!("Model: {}", args.model);

    let prompt = load_prompt(
        args.prompt.as_deref(),
        args.prompt_file.as_deref(),
        args.stdin,
    )?;
    log::info!("Prompt loaded ({} characters)", prompt.chars().count());

    validate_model(&args.model)?;
    validate_reference_images(&args.images, &args.model)?;
    validate_aspect_ratio(&args.aspect_ratio)?;
    if !args.images.is_empty() {
        log::info!("Reference images: {}", args.images.len());
    }

    let client = args.auth.client()?;

    let enhancement = if args.promptgen {
        log::info!("Enhancing prompt with AI...");
        let mut request = PromptRequest::new(prompt.clone());
        request.template = args.promptgen_template;
        let enhanced = generate_prompt(&client, &request)?;
        log::info!(
            "Prompt enhanced ({} characters)",
            enhanced.prompt.chars().count()
        );
        log::debug!(
            "Promptgen cost: ${:.4} ({} tokens)",
            enhanced.estimated_cost_usd,
            enhanced.tokens_used
        );
        Some(enhanced)
    } else {
        None
    };

    let final_prompt = enhancement
        .as_ref()
        .map(|enhanced| enhanced.prompt.clone())
        .unwrap_or_else(|| prompt.clone());

    log::info!("Starting image generation...");
    let result = generate_image(
        &client,
        &ImageRequest {
            prompt: final_prompt,
            output_path: args.output.clone(),
            reference_images: args.images.clone(),
            aspect_ratio: args.aspect_ratio.clone(),
            model: args.model.clone(),
            resolution: args.resolution,
        },
    )?;

    let mut payload = serde_json::to_value(&result)?;
    if let Value::Object(map) = &mut payload {
        map.insert(
            "promptgen".to_string(),
            promptgen_summary(&prompt, enhancement.as_ref()),
        );
    }
    println!("{}", serde_json::to_string_pretty(&payload)?);

    log::info!("Success! Image saved to: {}", args.output.display());
    log::info!("Resolution: {}", format_resolution(&args.aspect_ratio));
    Ok(())
}

pub(crate) fn run_conversation(args: ConversationArgs) -> Result<()> {
    log::info!("Starting multi-turn conversation generation");
    let prompt = args.prompt.trim();
    if prompt.is_empty() {
        return Err(nanobanana_engine::Error::validation("Prompt cannot be empty").into());
    }

    let mut session =
        ConversationSession::open(args.conversation_file.clone(), &args.model, &args.aspect_ratio)?;
    let client = args.auth.client()?;

    let outcome = session.generate_turn(&client, prompt, &args.output, args.resolution)?;
    if session.persist() {
        if let Some(path) = session.file() {
            log::info!("Conversation saved to: {}", path.display());
        }
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    log::info!("Turn {} completed successfully", outcome.turn_number);
    Ok(())
}

/// The `promptgen` block attached to generate output.
fn promptgen_summary(original: &str, enhancement: Option<&PromptGenResult>) -> Value {
    match enhancement {
        Some(enhanced) => json!({
            "enabled": true,
            "original_prompt": original,
            "enhanced_prompt": enhanced.prompt,
            "template_used": enhanced.template_used,
            "tokens_used": enhanced.tokens_used,
            "estimated_cost_usd": enhanced.estimated_cost_usd,
        }),
        None => json!({"enabled": false}),
    }
}
