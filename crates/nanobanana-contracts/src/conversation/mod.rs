use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::DEFAULT_ASPECT_RATIO;

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Conversation file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid conversation file format: {0}")]
    InvalidFormat(String),
    #[error("Conversation could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Conversation file I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One prompt/result step. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub prompt: String,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub reference_images: Vec<PathBuf>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default = "now_utc_iso")]
    pub timestamp: String,
}

impl ConversationTurn {
    pub fn new(
        prompt: impl Into<String>,
        output_path: Option<PathBuf>,
        reference_images: Vec<PathBuf>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            output_path,
            reference_images,
            metadata,
            timestamp: now_utc_iso(),
        }
    }
}

/// Append-only multi-turn log persisted as a single JSON document.
///
/// Nothing here writes to disk implicitly: after [`Conversation::add_turn`]
/// the caller must call [`Conversation::save`] or the turn is lost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub model: String,
    pub aspect_ratio: String,
    turns: Vec<ConversationTurn>,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    pub fn new(
        model: impl Into<String>,
        aspect_ratio: impl Into<String>,
        conversation_id: Option<String>,
    ) -> Self {
        let created_at = now_utc_iso();
        Self {
            conversation_id: conversation_id.unwrap_or_else(generate_conversation_id),
            model: model.into(),
            aspect_ratio: aspect_ratio.into(),
            turns: Vec::new(),
            updated_at: created_at.clone(),
            created_at,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConversationError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConversationError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConversationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let payload: Value = serde_json::from_str(&raw)
            .map_err(|err| ConversationError::InvalidFormat(err.to_string()))?;
        let conversation = Self::from_value(&payload)?;
        log::info!(
            "Conversation loaded: {} (turns={})",
            path.display(),
            conversation.turns.len()
        );
        Ok(conversation)
    }

    fn from_value(payload: &Value) -> Result<Self, ConversationError> {
        let Some(obj) = payload.as_object() else {
            return Err(ConversationError::InvalidFormat(
                "top-level value must be an object".to_string(),
            ));
        };
        let Some(model) = obj.get("model").and_then(Value::as_str) else {
            return Err(ConversationError::InvalidFormat(
                "missing required field 'model'".to_string(),
            ));
        };

        let mut conversation = Self::new(
            model,
            obj.get("aspect_ratio")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_ASPECT_RATIO),
            obj.get("conversation_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        );
        if let Some(created_at) = obj.get("created_at").and_then(Value::as_str) {
            conversation.created_at = created_at.to_string();
        }
        conversation.updated_at = obj
            .get("updated_at")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| conversation.created_at.clone());

        if let Some(turns) = obj.get("turns").and_then(Value::as_array) {
            for (idx, item) in turns.iter().enumerate() {
                let turn = serde_json::from_value::<ConversationTurn>(item.clone()).map_err(
                    |err| ConversationError::InvalidFormat(format!("turn {}: {err}", idx + 1)),
                )?;
                conversation.turns.push(turn);
            }
        }
        Ok(conversation)
    }

    pub fn to_value(&self) -> Result<Value, ConversationError> {
        serde_json::to_value(self).map_err(ConversationError::Encode)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConversationError> {
        let path = path.as_ref();
        log::debug!("Saving conversation to: {}", path.display());
        let io_err = |source| ConversationError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let rendered = serde_json::to_string_pretty(self).map_err(ConversationError::Encode)?;
        std::fs::write(path, rendered).map_err(io_err)?;
        log::info!("Conversation saved: {}", path.display());
        Ok(())
    }

    pub fn add_turn(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.updated_at = refreshed_timestamp(&self.updated_at);
        log::debug!(
            "Added turn {} to conversation {}",
            self.turns.len(),
            self.conversation_id
        );
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Reference images for the next turn: the previous turn's output, if it
    /// still exists on disk. At most one image is carried forward.
    pub fn next_reference_images(&self) -> Vec<PathBuf> {
        self.last_turn()
            .and_then(|turn| turn.output_path.as_ref())
            .filter(|path| path.is_file())
            .cloned()
            .into_iter()
            .collect()
    }
}

fn generate_conversation_id() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

// Keeps `updated_at` monotonic even if the wall clock stepped backwards.
fn refreshed_timestamp(previous: &str) -> String {
    let now = Utc::now();
    match DateTime::parse_from_rfc3339(previous) {
        Ok(prev) if prev.with_timezone(&Utc) > now => previous.to_string(),
        _ => now.to_rfc3339_opts(SecondsFormat::Micros, false),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::{json, Map, Value};

    use super::{Conversation, ConversationError, ConversationTurn};

    fn turn(prompt: &str, output: Option<PathBuf>) -> ConversationTurn {
        let mut metadata = Map::new();
        metadata.insert("token_count".to_string(), json!(1290));
        ConversationTurn::new(prompt, output, Vec::new(), metadata)
    }

    #[test]
    fn conversation_turns_roundtrip() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("nested").join("conversation.json");
        let mut conversation = Conversation::new("gemini-2.5-flash-image", "16:9", None);
        conversation.add_turn(turn("A sunset", Some(tmp.path().join("one.png"))));
        conversation.add_turn(turn("More orange", Some(tmp.path().join("two.png"))));
        conversation.save(&path)?;

        let loaded = Conversation::load(&path)?;
        assert_eq!(loaded.conversation_id, conversation.conversation_id);
        assert_eq!(loaded.model, "gemini-2.5-flash-image");
        assert_eq!(loaded.aspect_ratio, "16:9");
        assert_eq!(loaded.turns(), conversation.turns());
        assert_eq!(loaded.created_at, conversation.created_at);
        assert_eq!(loaded.updated_at, conversation.updated_at);
        Ok(())
    }

    #[test]
    fn add_turn_appends_and_refreshes_updated_at() {
        let mut conversation = Conversation::new("gemini-2.5-flash-image", "1:1", None);
        conversation.add_turn(turn("first", None));
        let before = conversation.updated_at.clone();
        let first = conversation.turns()[0].clone();

        conversation.add_turn(turn("second", None));
        assert_eq!(conversation.turns().len(), 2);
        assert_eq!(conversation.turns()[0], first);
        assert_eq!(conversation.turns()[1].prompt, "second");
        assert!(conversation.updated_at >= before);
        assert!(conversation.updated_at >= conversation.created_at);
    }

    #[test]
    fn load_tolerates_missing_optional_keys() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("conversation.json");
        std::fs::write(
            &path,
            serde_json::to_string(&json!({
                "model": "gemini-2.5-flash-image",
                "turns": [{"prompt": "bare turn"}],
                "created_at": "2026-01-02T03:04:05.000000+00:00",
            }))?,
        )?;

        let loaded = Conversation::load(&path)?;
        assert_eq!(loaded.aspect_ratio, "1:1");
        assert_eq!(loaded.updated_at, "2026-01-02T03:04:05.000000+00:00");
        assert!(!loaded.conversation_id.is_empty());
        let only = &loaded.turns()[0];
        assert_eq!(only.prompt, "bare turn");
        assert!(only.output_path.is_none());
        assert!(only.reference_images.is_empty());
        assert!(only.metadata.is_empty());
        Ok(())
    }

    #[test]
    fn load_reports_missing_file_and_bad_json() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let missing = tmp.path().join("missing.json");
        assert!(matches!(
            Conversation::load(&missing),
            Err(ConversationError::NotFound(_))
        ));

        let broken = tmp.path().join("broken.json");
        std::fs::write(&broken, "{not json")?;
        let err = Conversation::load(&broken).err();
        assert!(matches!(err, Some(ConversationError::InvalidFormat(_))));

        let no_model = tmp.path().join("no_model.json");
        std::fs::write(&no_model, "{\"turns\": []}")?;
        assert!(matches!(
            Conversation::load(&no_model),
            Err(ConversationError::InvalidFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn next_reference_follows_last_output_on_disk() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut conversation = Conversation::new("gemini-2.5-flash-image", "1:1", None);
        assert!(conversation.next_reference_images().is_empty());

        let older = tmp.path().join("older.png");
        let latest = tmp.path().join("latest.png");
        std::fs::write(&older, b"png")?;
        std::fs::write(&latest, b"png")?;
        conversation.add_turn(turn("one", Some(older)));
        conversation.add_turn(turn("two", Some(latest.clone())));
        assert_eq!(conversation.next_reference_images(), vec![latest.clone()]);

        std::fs::remove_file(&latest)?;
        assert!(conversation.next_reference_images().is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn unencodable_turn_fails_save_without_touching_file() -> anyhow::Result<()> {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("conversation.json");
        let mut conversation = Conversation::new("gemini-2.5-flash-image", "1:1", None);
        conversation.add_turn(turn("ok", Some(tmp.path().join("one.png"))));
        conversation.save(&path)?;
        let before = std::fs::read_to_string(&path)?;

        let odd = tmp.path().join(OsStr::from_bytes(b"bad-\xff.png"));
        conversation.add_turn(turn("odd", Some(odd)));
        assert!(matches!(
            conversation.save(&path),
            Err(ConversationError::Encode(_))
        ));
        assert!(conversation.to_value().is_err());
        assert_eq!(std::fs::read_to_string(&path)?, before);
        assert_eq!(Conversation::load(&path)?.turns().len(), 1);
        Ok(())
    }

    #[test]
    fn saved_document_keeps_field_order() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("conversation.json");
        Conversation::new("gemini-2.5-flash-image", "1:1", None).save(&path)?;
        let raw = std::fs::read_to_string(&path)?;
        let positions = [
            "\"conversation_id\"",
            "\"model\"",
            "\"aspect_ratio\"",
            "\"turns\"",
            "\"created_at\"",
            "\"updated_at\"",
        ]
        .iter()
        .map(|key| raw.find(key).unwrap_or(usize::MAX))
        .collect::<Vec<usize>>();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{raw}");
        Ok(())
    }

    #[test]
    fn saved_document_has_expected_shape() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("conversation.json");
        let mut conversation =
            Conversation::new("gemini-2.5-flash-image", "1:1", Some("conv-1".to_string()));
        conversation.add_turn(turn("hello", None));
        conversation.save(&path)?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(parsed["conversation_id"], json!("conv-1"));
        assert_eq!(parsed["turns"][0]["prompt"], json!("hello"));
        assert_eq!(parsed["turns"][0]["output_path"], Value::Null);
        assert_eq!(parsed["turns"][0]["metadata"]["token_count"], json!(1290));
        assert!(parsed["turns"][0]["timestamp"].as_str().is_some());
        Ok(())
    }
}
