use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::wire::{ContentRequest, ContentResponse, ImagesRequest, ImagesResponse};
use super::GenAiClient;
use crate::Error;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    Vertex {
        project: String,
        location: String,
        access_token: String,
    },
}

/// Explicit connection settings from the command line. Anything left unset is
/// filled from the environment when resolved; explicit values always win.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub use_vertex: bool,
    pub project: Option<String>,
    pub location: Option<String>,
    pub access_token: Option<String>,
}

impl ClientConfig {
    pub fn resolve(&self) -> Result<Credentials, Error> {
        self.resolve_with(&non_empty_env)
    }

    pub fn resolve_with(&self, lookup: EnvLookup<'_>) -> Result<Credentials, Error> {
        let vertex_env = lookup("GOOGLE_GENAI_USE_VERTEXAI")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        if self.use_vertex || vertex_env {
            log::debug!("Using Vertex AI authentication");
            let project = explicit_or_env(&self.project, lookup, "GOOGLE_CLOUD_PROJECT")
                .ok_or_else(|| {
                    Error::Authentication(
                        "GOOGLE_CLOUD_PROJECT environment variable or --project is required for \
                         Vertex AI. Set it with: export GOOGLE_CLOUD_PROJECT='your-project-id'"
                            .to_string(),
                    )
                })?;
            let location = explicit_or_env(&self.location, lookup, "GOOGLE_CLOUD_LOCATION")
                .ok_or_else(|| {
                    Error::Authentication(
                        "GOOGLE_CLOUD_LOCATION environment variable or --location is required \
                         for Vertex AI. Set it with: export GOOGLE_CLOUD_LOCATION='us-central1'"
                            .to_string(),
                    )
                })?;
            let access_token =
                explicit_or_env(&self.access_token, lookup, "GOOGLE_CLOUD_ACCESS_TOKEN")
                    .ok_or_else(|| {
                        Error::Authentication(
                            "An OAuth access token is required for Vertex AI. Pass \
                             --access-token or set GOOGLE_CLOUD_ACCESS_TOKEN, e.g. from \
                             'gcloud auth print-access-token'"
                                .to_string(),
                        )
                    })?;
            log::debug!("Vertex AI config: project={project}, location={location}");
            return Ok(Credentials::Vertex {
                project,
                location,
                access_token,
            });
        }

        log::debug!("Using Gemini Developer API authentication");
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .or_else(|| lookup("GEMINI_API_KEY"))
            .ok_or_else(|| {
                Error::Authentication(
                    "API key is required. Set GEMINI_API_KEY or GOOGLE_API_KEY environment \
                     variable, or use --api-key option. Get your API key from \
                     https://aistudio.google.com/app/apikey"
                        .to_string(),
                )
            })?;
        Ok(Credentials::ApiKey(api_key))
    }
}

/// Blocking REST client for the Gemini Developer API and Vertex AI.
///
/// One request per call: no timeout is layered on top of the transport and
/// nothing is retried.
pub struct HttpGenAiClient {
    credentials: Credentials,
    api_base: String,
    http: HttpClient,
}

impl HttpGenAiClient {
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let http = HttpClient::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| Error::Authentication(format!("Failed to create client: {err}")))?;
        let api_base = env::var("GEMINI_API_BASE")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        match &credentials {
            Credentials::ApiKey(_) => log::info!("Creating Gemini Developer API client"),
            Credentials::Vertex {
                project, location, ..
            } => log::info!(
                "Creating Vertex AI client for project={project}, location={location}"
            ),
        }
        Ok(Self {
            credentials,
            api_base,
            http,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        Self::new(config.resolve()?)
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        let model = model.trim().trim_start_matches("models/");
        match &self.credentials {
            Credentials::ApiKey(_) => format!("{}/models/{model}:{method}", self.api_base),
            Credentials::Vertex {
                project, location, ..
            } => format!(
                "{}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:{method}",
                vertex_host(location)
            ),
        }
    }

    fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        provider: &str,
        endpoint: &str,
        payload: &T,
    ) -> Result<R> {
        log::debug!("POST {endpoint}");
        let request = self.http.post(endpoint).json(payload);
        let request = match &self.credentials {
            Credentials::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Credentials::Vertex { access_token, .. } => {
                request.header(AUTHORIZATION, format!("Bearer {access_token}"))
            }
        };
        let response = request
            .send()
            .with_context(|| format!("{provider} request failed ({endpoint})"))?;
        let body = response_text_or_error(provider, response)?;
        serde_json::from_str(&body)
            .with_context(|| format!("{provider} returned invalid JSON payload"))
    }
}

impl GenAiClient for HttpGenAiClient {
    fn generate_content(&self, model: &str, request: &ContentRequest) -> Result<ContentResponse> {
        let endpoint = self.endpoint(model, "generateContent");
        self.post_json("Gemini", &endpoint, request)
    }

    fn generate_images(&self, model: &str, request: &ImagesRequest) -> Result<ImagesResponse> {
        let endpoint = self.endpoint(model, "predict");
        self.post_json("Imagen", &endpoint, request)
    }
}

fn vertex_host(location: &str) -> String {
    if location == "global" {
        "https://aiplatform.googleapis.com".to_string()
    } else {
        format!("https://{location}-aiplatform.googleapis.com")
    }
}

fn response_text_or_error(provider: &str, response: HttpResponse) -> Result<String> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    Ok(body)
}

fn explicit_or_env(explicit: &Option<String>, lookup: EnvLookup<'_>, key: &str) -> Option<String> {
    explicit
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| lookup(key))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
