//! Error types for the ats-resume library.
//!
//! Every failure in the pipeline is fatal for the action that hit it: a
//! render failure means there is no image to send, and a remote failure means
//! there is no evaluation to show. Nothing is retried and nothing partial is
//! returned, so a single [`AtsError`] enum is enough. Variants carry the
//! context a front end needs to phrase a message (document name and size,
//! model and HTTP status).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ats-resume library.
#[derive(Debug, Error)]
pub enum AtsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No document bytes were supplied.
    #[error("No resume document provided.\nUpload a PDF before running an evaluation.")]
    NoDocumentProvided,

    /// A document path was given but the file could not be read.
    #[error("Failed to read resume '{path}': {source}")]
    DocumentUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The bytes could not be parsed, rasterised, or encoded.
    #[error("Could not render the first page of '{document}' ({size} bytes): {detail}")]
    RenderingFailed {
        document: String,
        size: usize,
        detail: String,
    },

    // ── Dispatch errors ───────────────────────────────────────────────────
    /// The requested task name is not one of the supported evaluations.
    #[error("Unsupported task '{task}'. Expected one of: analyze, match, keywords")]
    InvalidTask { task: String },

    /// The remote model could not produce a usable text response.
    #[error("{}", remote_call_message(.model, .status, .detail))]
    RemoteCallFailed {
        model: String,
        status: Option<u16>,
        detail: String,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn remote_call_message(model: &str, status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(code) => format!("Call to model '{model}' failed with HTTP {code}: {detail}"),
        None => format!("Call to model '{model}' failed: {detail}"),
    }
}

impl AtsError {
    /// Shorthand for a [`AtsError::RemoteCallFailed`] without an HTTP status.
    pub(crate) fn remote(model: &str, detail: impl Into<String>) -> Self {
        AtsError::RemoteCallFailed {
            model: model.to_string(),
            status: None,
            detail: detail.into(),
        }
    }

    /// `true` for the errors produced by the Prompt Dispatcher's remote call.
    pub fn is_remote(&self) -> bool {
        matches!(self, AtsError::RemoteCallFailed { .. })
    }
}
