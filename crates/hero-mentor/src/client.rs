//! Text-generation collaborators.
//!
//! `GeminiClient` talks to the generateContent HTTP API. `OfflineGenerator`
//! always fails, which makes the mentor fall back to its static line.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MentorConfig;
use crate::prompt::MentorRequest;
use crate::{MentorError, TextGenerator};

/// HTTP client for the generateContent API.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, api_base: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn from_config(config: &MentorConfig, api_key: String) -> Self {
        Self::new(api_key, config.api_base.clone(), config.model.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &MentorRequest) -> Result<String, MentorError> {
        let body = GenerateRequest::from(request);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MentorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MentorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| MentorError::Decode(e.to_string()))?;
        Ok(reply.text())
    }
}

/// Generator used when no API key is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _request: &MentorRequest) -> Result<String, MentorError> {
        Err(MentorError::Offline)
    }
}

/// Pick the generator for `config`: HTTP when a key is available, offline otherwise.
pub fn generator_from_config(config: &MentorConfig) -> Box<dyn TextGenerator> {
    match config.api_key() {
        Some(key) => Box::new(GeminiClient::from_config(config, key)),
        None => {
            info!(
                env = %config.api_key_env,
                "no mentor API key, using offline messages"
            );
            Box::new(OfflineGenerator)
        }
    }
}

// generateContent wire format
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl From<&MentorRequest> for GenerateRequest {
    fn from(r: &MentorRequest) -> Self {
        Self {
            system_instruction: Content::text(None, &r.system),
            contents: vec![Content::text(Some("user"), &r.prompt)],
            generation_config: GenerationConfig {
                temperature: r.temperature,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated. Empty when absent.
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
