//! Pipeline stages for resume evaluation.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm
//! (bytes)   (pdfium)   (base64)   (Gemini)
//! ```
//!
//! 1. [`input`]  — wrap the uploaded bytes with a display name
//! 2. [`render`] — rasterise page 1 only; blocking, pdfium is not async-safe
//! 3. [`encode`] — JPEG/PNG-encode and base64-wrap the bitmap
//! 4. [`llm`]    — send context, image and instruction as one multimodal
//!    request; the only stage with network I/O
//!
//! Stages 1–3 run once per document; stage 4 runs once per requested task.

pub mod encode;
pub mod input;
pub mod llm;
pub mod render;
