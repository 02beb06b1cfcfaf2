//! # ats-resume
//!
//! Evaluate a resume against a job description with a multimodal Gemini model.
//!
//! The resume is not parsed. Its first page is rasterised and sent to the
//! model as an image next to the job description and a task instruction, so
//! layout, emphasis and section order reach the model the way a recruiter
//! would see them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Render   page 1 only, via pdfium (blocking)
//!  ├─ 2. Encode   JPEG → base64 EncodedImagePart      (once per document)
//!  ├─ 3. Dispatch [job description, image, instruction] → Gemini
//!  └─ 4. Output   ModelResponse text + download report (once per task)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ats_resume::{
//!     Evaluator, ModelConfig, PdfiumRenderer, RenderConfig, ResumeSession, Task,
//!     UploadedDocument,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let document = UploadedDocument::from_path("resume.pdf")?;
//!     let renderer = PdfiumRenderer::new(RenderConfig::default());
//!     // Reads GOOGLE_API_KEY
//!     let evaluator = Evaluator::gemini(ModelConfig::from_env())?;
//!
//!     let session = ResumeSession::open(&document, &renderer, evaluator)?;
//!     let response = session
//!         .run("Business Analyst role requiring SQL and Tableau", Task::PercentageMatch)
//!         .await?;
//!     println!("{}", response.report());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ats-resume` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod evaluate;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ModelConfig, ModelConfigBuilder, RasterFormat, RenderConfig, RenderConfigBuilder};
pub use error::AtsError;
pub use evaluate::Evaluator;
pub use output::ModelResponse;
pub use pipeline::encode::{encode_page, EncodedImagePart};
pub use pipeline::input::UploadedDocument;
pub use pipeline::llm::{GeminiClient, GenerativeModel, PromptRequest};
pub use pipeline::render::{render_first_page, DocumentRenderer, PdfiumRenderer, RenderedPage};
pub use prompts::{instruction, Task};
pub use session::ResumeSession;
