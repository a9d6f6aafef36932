//! Prompt enhancement: a text-only call that expands a short description into
//! a detailed image prompt.

use nanobanana_contracts::models::{text_model_cost_per_token, DEFAULT_TEXT_MODEL};
use nanobanana_contracts::prompts::{detect_category, PromptTemplate};
use serde::Serialize;

use crate::client::wire::{Content, ContentRequest, ContentResponse, GenerationConfig, Part};
use crate::client::GenAiClient;
use crate::response::token_cost;
use crate::{Error, Result};

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 500;
const RULE_WIDTH: usize = 70;

const SYSTEM_PROMPT: &str = "\
You are an expert prompt engineer for Gemini image generation models (Nano Banana).
Transform simple descriptions into detailed, effective image generation prompts.

Follow these principles:
1. Be specific and descriptive - include details about subjects, objects, and their relationships
2. Include style, mood, and atmosphere - specify artistic approach and emotional tone
3. Describe composition and perspective - camera angles, framing, depth
4. Specify colors and palette - be explicit about color choices
5. Include technical details - quality level, detail, texture, lighting

Output only the enhanced prompt text, nothing else. Do not include explanations or metadata.
Make the prompt detailed but concise (aim for 50-100 words).
";

#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub description: String,
    /// An explicit template disables category detection.
    pub template: Option<PromptTemplate>,
    /// Free-form hint; wins over the detected category.
    pub category: Option<String>,
    pub style: Option<String>,
    pub model: String,
}

impl PromptRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            template: None,
            category: None,
            style: None,
            model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptGenResult {
    pub prompt: String,
    pub original: String,
    pub template_used: Option<PromptTemplate>,
    pub category: Option<String>,
    pub style: Option<String>,
    pub tokens_used: u64,
    pub estimated_cost_usd: f64,
}

/// Returns `(system, user, category)` for a request.
pub fn build_prompt_messages(request: &PromptRequest) -> (String, String, Option<String>) {
    let category = request.category.clone().or_else(|| {
        if request.template.is_some() {
            return None;
        }
        detect_category(&request.description).map(|found| found.as_str().to_string())
    });

    let mut system = SYSTEM_PROMPT.to_string();
    if let Some(template) = request.template {
        system.push_str("\n\nUse this template approach:\n");
        system.push_str(template.instructions());
    }

    let mut user = format!(
        "Transform this simple description into a detailed image generation prompt:\n\n{}",
        request.description
    );
    if let Some(category) = &category {
        user.push_str(&format!("\n\nCategory context: {category}"));
    }
    if let Some(style) = &request.style {
        user.push_str(&format!("\nDesired style: {style}"));
    }
    (system, user, category)
}

pub fn generate_prompt(client: &dyn GenAiClient, request: &PromptRequest) -> Result<PromptGenResult> {
    let (system, user, category) = build_prompt_messages(request);
    log::info!(
        "Enhancing prompt with {} (category={})",
        request.model,
        category.as_deref().unwrap_or("none")
    );

    let payload = ContentRequest {
        contents: vec![Content::user(vec![Part::text(user)])],
        system_instruction: Some(Content::system(system)),
        generation_config: GenerationConfig {
            temperature: Some(TEMPERATURE),
            max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            ..GenerationConfig::default()
        },
    };

    let response = client
        .generate_content(&request.model, &payload)
        .map_err(|err| Error::PromptGeneration(format!("Prompt generation failed: {err:#}")))?;
    let prompt = extract_text(&response)
        .map_err(|message| Error::PromptGeneration(format!("Prompt generation failed: {message}")))?;

    let tokens_used = response
        .usage_metadata
        .as_ref()
        .and_then(|usage| usage.total_token_count)
        .unwrap_or(0);
    log::debug!("Prompt enhancement used {tokens_used} tokens");

    Ok(PromptGenResult {
        prompt,
        original: request.description.clone(),
        template_used: request.template,
        category,
        style: request.style.clone(),
        tokens_used,
        estimated_cost_usd: token_cost(tokens_used, text_model_cost_per_token(&request.model)),
    })
}

fn extract_text(response: &ContentResponse) -> std::result::Result<String, &'static str> {
    let candidate = response
        .candidates
        .first()
        .ok_or("No response from model. The request may have been blocked.")?;
    let part = candidate
        .content
        .as_ref()
        .and_then(|content| content.parts.first())
        .ok_or("Empty response from model")?;
    let text = part
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or("Empty text in response")?;
    Ok(text.to_string())
}

pub fn format_verbose_output(result: &PromptGenResult) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "Prompt Generation Analysis".to_string(),
        rule.clone(),
        String::new(),
        "Original Description:".to_string(),
        format!("  {}", result.original),
        String::new(),
    ];
    if let Some(template) = result.template_used {
        lines.push(format!("Template Used: {template}"));
    }
    if let Some(category) = &result.category {
        lines.push(format!("Category: {category}"));
    }
    if let Some(style) = &result.style {
        lines.push(format!("Style: {style}"));
    }
    lines.push(format!("Tokens Used: {}", result.tokens_used));
    lines.push(format!("Estimated Cost: ${:.4}", result.estimated_cost_usd));
    lines.extend([
        String::new(),
        rule.clone(),
        "Generated Prompt:".to_string(),
        rule,
        String::new(),
        result.prompt.clone(),
        String::new(),
    ]);
    lines.join("\n")
}
