pub mod client;
mod error;
pub mod generator;
pub mod promptgen;
pub mod request;
pub mod response;
pub mod session;
pub mod validation;

pub use client::{ClientConfig, Credentials, GenAiClient, HttpGenAiClient};
pub use error::{Error, Result};
pub use generator::{generate_image, GenerationResult, ImageRequest};
pub use promptgen::{format_verbose_output, generate_prompt, PromptGenResult, PromptRequest};
pub use session::{ConversationSession, TurnOutcome};
