//! The Prompt Dispatcher: one task, one remote call, one text response.

use crate::config::ModelConfig;
use crate::error::AtsError;
use crate::output::ModelResponse;
use crate::pipeline::encode::EncodedImagePart;
use crate::pipeline::llm::{GeminiClient, GenerativeModel, PromptRequest};
use crate::prompts::{instruction, Task};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Dispatches evaluation requests to a [`GenerativeModel`].
///
/// Holds no per-request state, so one `Evaluator` can serve any number of
/// documents and tasks. Cloning is cheap.
#[derive(Clone)]
pub struct Evaluator {
    model: Arc<dyn GenerativeModel>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("model", &self.model.model_name())
            .finish()
    }
}

impl Evaluator {
    /// Use a caller-supplied model (a test double, a proxy, …).
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Use the Gemini REST API configured by `config`.
    pub fn gemini(config: ModelConfig) -> Result<Self, AtsError> {
        Ok(Self::new(Arc::new(GeminiClient::new(config)?)))
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Evaluate the resume image against `context_text` for `task`.
    ///
    /// `context_text` may be empty; it is still sent as the first part.
    /// Makes exactly one remote call and never retries.
    ///
    /// # Errors
    /// [`AtsError::RemoteCallFailed`] when the service is unreachable, returns
    /// an error status, or produces no text.
    pub async fn evaluate(
        &self,
        context_text: &str,
        image_part: &EncodedImagePart,
        task: Task,
    ) -> Result<ModelResponse, AtsError> {
        let start = Instant::now();
        if context_text.trim().is_empty() {
            debug!("Task '{}': job description is empty", task);
        }
        info!("Task '{}': dispatching to '{}'", task, self.model.model_name());

        let request = PromptRequest::new(context_text, image_part, instruction(task));
        let text = match self.model.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Task '{}': {}", task, e);
                return Err(e);
            }
        };

        if text.trim().is_empty() {
            return Err(AtsError::remote(
                self.model.model_name(),
                "model returned an empty response",
            ));
        }

        let response = ModelResponse::new(task, text);
        info!(
            "Task '{}': {} chars in {}ms",
            task,
            response.char_count(),
            start.elapsed().as_millis()
        );
        Ok(response)
    }

    /// Like [`Evaluator::evaluate`], with the task given by name.
    ///
    /// Unknown names fail with [`AtsError::InvalidTask`] before any call is made.
    pub async fn evaluate_named(
        &self,
        context_text: &str,
        image_part: &EncodedImagePart,
        task: &str,
    ) -> Result<ModelResponse, AtsError> {
        let task: Task = task.parse()?;
        self.evaluate(context_text, image_part, task).await
    }

    /// Synchronous wrapper around [`Evaluator::evaluate`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn evaluate_sync(
        &self,
        context_text: &str,
        image_part: &EncodedImagePart,
        task: Task,
    ) -> Result<ModelResponse, AtsError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| AtsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.evaluate(context_text, image_part, task))
    }
}
