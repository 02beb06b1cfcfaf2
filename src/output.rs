//! Evaluation results.

use crate::prompts::Task;
use serde::{Deserialize, Serialize};

/// Text produced by the model for one task.
///
/// The text is kept exactly as the model returned it; nothing here parses
/// or validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub task: Task,
    pub text: String,
}

impl ModelResponse {
    pub fn new(task: Task, text: impl Into<String>) -> Self {
        Self {
            task,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in characters, not bytes.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// The downloadable report: the task heading, a blank line, the text.
    pub fn report(&self) -> String {
        format!("{}:\n\n{}", self.task.report_title(), self.text)
    }

    /// Suggested file name for [`ModelResponse::report`].
    pub fn report_file_name(&self) -> &'static str {
        self.task.report_file_name()
    }
}
