mod http;
pub mod wire;

use anyhow::Result;

pub use http::{ClientConfig, Credentials, EnvLookup, HttpGenAiClient};
pub use wire::{ContentRequest, ContentResponse, ImagesRequest, ImagesResponse};

/// Minimal view of the remote generative API. Generation and prompt
/// enhancement only talk to the provider through this trait.
pub trait GenAiClient: Send + Sync {
    /// Multimodal `generateContent` call, used for Gemini image output and
    /// for plain text completions.
    fn generate_content(&self, model: &str, request: &ContentRequest) -> Result<ContentResponse>;

    /// Imagen `predict` call.
    fn generate_images(&self, model: &str, request: &ImagesRequest) -> Result<ImagesResponse>;
}
