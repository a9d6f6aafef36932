use std::path::{Path, PathBuf};

use nanobanana_contracts::conversation::{Conversation, ConversationTurn};
use nanobanana_contracts::models::ResolutionTier;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::client::GenAiClient;
use crate::generator::{generate_image, GenerationResult, ImageRequest};
use crate::validation::{validate_aspect_ratio, validate_model};
use crate::Result;

/// A conversation bound to its (optional) backing file for one invocation.
#[derive(Debug)]
pub struct ConversationSession {
    conversation: Conversation,
    file: Option<PathBuf>,
}

/// Generation result plus conversation bookkeeping, printed as one JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    #[serde(flatten)]
    pub result: GenerationResult,
    pub conversation_id: String,
    pub turn_number: usize,
    pub conversation_file: Option<PathBuf>,
}

impl ConversationSession {
    /// Loads `file` when it exists; the stored model and aspect ratio then win
    /// over the arguments. Otherwise starts a new conversation from the
    /// arguments, which must be valid.
    pub fn open(file: Option<PathBuf>, model: &str, aspect_ratio: &str) -> Result<Self> {
        if let Some(path) = file.as_deref().filter(|path| path.exists()) {
            log::info!("Loading existing conversation: {}", path.display());
            let conversation = Conversation::load(path)?;
            log::debug!(
                "Using conversation settings: model={}, aspect_ratio={}",
                conversation.model,
                conversation.aspect_ratio
            );
            return Ok(Self { conversation, file });
        }

        match file.as_deref() {
            Some(path) => log::info!("Creating new conversation: {}", path.display()),
            None => log::warn!("No conversation file specified - conversation won't be saved"),
        }
        validate_aspect_ratio(aspect_ratio)?;
        validate_model(model)?;
        let conversation = Conversation::new(model, aspect_ratio, None);
        log::debug!("Created new conversation: {}", conversation.conversation_id);
        Ok(Self { conversation, file })
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn reference_images(&self) -> Vec<PathBuf> {
        self.conversation.next_reference_images()
    }

    /// Generates the next image and appends the turn in memory. Call
    /// [`ConversationSession::persist`] afterwards to keep it.
    pub fn generate_turn(
        &mut self,
        client: &dyn GenAiClient,
        prompt: &str,
        output_path: &Path,
        resolution: Option<ResolutionTier>,
    ) -> Result<TurnOutcome> {
        let turn_number = self.conversation.turns().len() + 1;
        log::info!("Turn {turn_number}: {}", preview(prompt, 50));
        let reference_images = self.reference_images();
        if let Some(previous) = reference_images.first() {
            log::debug!("Using previous output as reference: {}", previous.display());
        }

        let result = generate_image(
            client,
            &ImageRequest {
                prompt: prompt.to_string(),
                output_path: output_path.to_path_buf(),
                reference_images: reference_images.clone(),
                aspect_ratio: self.conversation.aspect_ratio.clone(),
                model: self.conversation.model.clone(),
                resolution,
            },
        )?;

        let mut metadata = Map::new();
        metadata.insert("token_count".to_string(), json!(result.token_count));
        metadata.insert("resolution".to_string(), json!(result.resolution));
        metadata.insert(
            "finish_reason".to_string(),
            result
                .metadata
                .get("finish_reason")
                .cloned()
                .unwrap_or(Value::Null),
        );
        // Only what was actually sent; Imagen drops reference images.
        let sent_references = if result.reference_image_count == 0 {
            Vec::new()
        } else {
            reference_images
        };
        self.conversation.add_turn(ConversationTurn::new(
            prompt,
            Some(output_path.to_path_buf()),
            sent_references,
            metadata,
        ));

        Ok(TurnOutcome {
            result,
            conversation_id: self.conversation.conversation_id.clone(),
            turn_number: self.conversation.turns().len(),
            conversation_file: self.file.clone(),
        })
    }

    /// Best-effort save. Failures are logged and reported as `false`; the
    /// generated image is still a success.
    pub fn persist(&self) -> bool {
        let Some(path) = self.file.as_deref() else {
            return false;
        };
        match self.conversation.save(path) {
            Ok(()) => true,
            Err(err) => {
                log::error!("Failed to save conversation: {err}");
                false
            }
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    format!("{}...", text.chars().take(max_chars).collect::<String>())
}
