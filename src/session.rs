//! One uploaded resume, rendered once, evaluated any number of times.
//!
//! A [`ResumeSession`] owns the encoded first page of a document. Opening
//! the session is the only time the renderer runs; every task afterwards
//! reuses the same read-only image.

use crate::error::AtsError;
use crate::evaluate::Evaluator;
use crate::output::ModelResponse;
use crate::pipeline::encode::EncodedImagePart;
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::render::DocumentRenderer;
use crate::prompts::Task;
use std::sync::Arc;
use tracing::info;

/// An uploaded resume bound to an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct ResumeSession {
    document_name: String,
    image: Arc<EncodedImagePart>,
    evaluator: Evaluator,
}

impl ResumeSession {
    /// Render `document` once with `renderer` and keep the result.
    ///
    /// Fails with the renderer's error; no session exists without an image.
    pub fn open(
        document: &UploadedDocument,
        renderer: &dyn DocumentRenderer,
        evaluator: Evaluator,
    ) -> Result<Self, AtsError> {
        let image = renderer.render_first_page(document)?;
        info!(
            "Session opened for '{}' ({} bytes of {})",
            document.name(),
            image.encoded_len(),
            image.mime_type()
        );
        Ok(Self::from_image(document.name(), image, evaluator))
    }

    /// Build a session around an image rendered elsewhere.
    pub fn from_image(
        document_name: impl Into<String>,
        image: EncodedImagePart,
        evaluator: Evaluator,
    ) -> Self {
        Self {
            document_name: document_name.into(),
            image: Arc::new(image),
            evaluator,
        }
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    pub fn image_part(&self) -> &EncodedImagePart {
        &self.image
    }

    /// Run `task` against `job_description` with the session's image.
    pub async fn run(
        &self,
        job_description: &str,
        task: Task,
    ) -> Result<ModelResponse, AtsError> {
        self.evaluator
            .evaluate(job_description, &self.image, task)
            .await
    }

    /// Run every task in order, collecting each outcome.
    ///
    /// A failed task does not stop the others.
    pub async fn run_all(
        &self,
        job_description: &str,
    ) -> Vec<(Task, Result<ModelResponse, AtsError>)> {
        let mut results = Vec::with_capacity(Task::ALL.len());
        for task in Task::ALL {
            results.push((task, self.run(job_description, task).await));
        }
        results
    }
}
