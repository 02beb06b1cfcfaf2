//! Model interaction: build the multimodal request and call Gemini.
//!
//! Every request is a single user turn made of exactly three parts, in order:
//!
//! 1. **Context** — the job description as plain text (may be empty)
//! 2. **Image** — page 1 of the resume as inline base64 data
//! 3. **Instruction** — the fixed text for the requested task
//!
//! [`GenerativeModel`] is the seam between the dispatcher and the wire.
//! [`GeminiClient`] talks to the `generateContent` REST endpoint; tests and
//! embedders can substitute their own implementation.
//!
//! There is no retry loop. A failed call surfaces immediately as
//! [`AtsError::RemoteCallFailed`] and the next call starts from scratch.

use crate::config::ModelConfig;
use crate::error::AtsError;
use crate::pipeline::encode::EncodedImagePart;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The ordered triple sent to the model for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    pub context_text: &'a str,
    pub image_part: &'a EncodedImagePart,
    pub instruction_text: &'a str,
}

impl<'a> PromptRequest<'a> {
    pub fn new(
        context_text: &'a str,
        image_part: &'a EncodedImagePart,
        instruction_text: &'a str,
    ) -> Self {
        Self {
            context_text,
            image_part,
            instruction_text,
        }
    }

    /// The request as Gemini content parts: text, inline image, text.
    fn parts(&self) -> [Part<'a>; 3] {
        [
            Part::Text {
                text: self.context_text,
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: self.image_part.mime_type(),
                    data: self.image_part.data(),
                },
            },
            Part::Text {
                text: self.instruction_text,
            },
        ]
    }
}

/// A remote model that turns a [`PromptRequest`] into text.
///
/// Implementations make one call per invocation and keep no state between
/// calls. Every failure is reported as [`AtsError::RemoteCallFailed`].
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier, used in logs and errors.
    fn model_name(&self) -> &str;

    /// Submit `request` and return the generated text.
    async fn generate(&self, request: &PromptRequest<'_>) -> Result<String, AtsError>;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 3],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    status: Option<String>,
}

// ── Gemini client ────────────────────────────────────────────────────────

/// [`GenerativeModel`] backed by the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish()
    }
}

impl GeminiClient {
    /// Build a client for `config`.
    ///
    /// A missing API key is accepted here and reported by the first call.
    pub fn new(config: ModelConfig) -> Result<Self, AtsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| AtsError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn build_body<'a>(&self, request: &PromptRequest<'a>) -> GenerateContentRequest<'a> {
        let generation_config =
            if self.config.temperature.is_some() || self.config.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_output_tokens,
                })
            } else {
                None
            };

        GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: request.parts(),
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: &PromptRequest<'_>) -> Result<String, AtsError> {
        let model = self.config.model.as_str();
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AtsError::remote(
                model,
                "no API key configured. Set GOOGLE_API_KEY in the environment or a .env file.",
            )
        })?;

        let start = Instant::now();
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| {
                let detail = if e.is_timeout() {
                    format!(
                        "no response within {}s",
                        self.config.api_timeout_secs
                    )
                } else {
                    format!("request failed: {e}")
                };
                warn!("Model '{}': {}", model, detail);
                AtsError::remote(model, detail)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AtsError::RemoteCallFailed {
            model: model.to_string(),
            status: Some(status.as_u16()),
            detail: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => match err.error.status {
                    Some(s) => format!("{s}: {}", err.error.message),
                    None => err.error.message,
                },
                Err(_) => truncate(&body, 200),
            };
            warn!("Model '{}': HTTP {} — {}", model, status.as_u16(), detail);
            return Err(AtsError::RemoteCallFailed {
                model: model.to_string(),
                status: Some(status.as_u16()),
                detail,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| AtsError::RemoteCallFailed {
                model: model.to_string(),
                status: Some(status.as_u16()),
                detail: format!("unexpected response body: {e}"),
            })?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Model '{}': {} input tokens, {} output tokens, {:?}",
                model,
                usage.prompt_token_count,
                usage.candidates_token_count,
                start.elapsed()
            );
        }

        extract_text(parsed).map_err(|detail| AtsError::RemoteCallFailed {
            model: model.to_string(),
            status: Some(status.as_u16()),
            detail,
        })
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(format!("prompt was blocked ({reason})"));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| "response contained no candidates".to_string())?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(format!("response contained no text (finish reason: {reason})"));
    }
    Ok(text)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}
