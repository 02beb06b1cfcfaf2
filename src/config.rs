//! Configuration types for rendering and model dispatch.
//!
//! Two independent structs reflect the two halves of the pipeline:
//!
//! * [`RenderConfig`] controls how page 1 is rasterised and encoded. It needs
//!   no credential, so a document can be rendered (and inspected) offline.
//! * [`ModelConfig`] identifies the remote model and carries the API key. It
//!   is handed to [`crate::pipeline::llm::GeminiClient::new`] explicitly;
//!   nothing in the library reads the environment at call time.
//!
//! Both are built via builders that clamp inputs and validate in `build()`.

use crate::error::AtsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Gemini model, a fast multimodal model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default REST endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Secondary API key variable, checked when [`API_KEY_ENV`] is unset.
pub const API_KEY_FALLBACK_ENV: &str = "GEMINI_API_KEY";

// ── Rendering ────────────────────────────────────────────────────────────

/// Raster encoding for the rendered first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    /// Lossy JPEG at the given quality (1–100).
    Jpeg { quality: u8 },
    /// Lossless PNG.
    Png,
}

impl Default for RasterFormat {
    fn default() -> Self {
        RasterFormat::Jpeg { quality: 75 }
    }
}

impl RasterFormat {
    /// MIME type matching the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Jpeg { .. } => "image/jpeg",
            RasterFormat::Png => "image/png",
        }
    }
}

/// Configuration for rendering the first page of an uploaded document.
///
/// # Example
/// ```rust
/// use ats_resume::{RasterFormat, RenderConfig};
///
/// let config = RenderConfig::builder()
///     .dpi(150)
///     .format(RasterFormat::Png)
///     .build()
///     .unwrap();
/// assert_eq!(config.format.mime_type(), "image/png");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RenderConfigFields")]
pub struct RenderConfig {
    /// Rendering resolution. Range: 72–400. Default: 200.
    ///
    /// 200 DPI is what common PDF rasterisers use when no resolution is
    /// given; a letter page comes out at roughly 1700 × 2200 px.
    pub dpi: u32,

    /// Cap on the longest edge of the rendered page, in pixels. Default: 2500.
    ///
    /// Oversized media boxes (posters, scanned A3) are scaled down to fit.
    pub max_rendered_pixels: u32,

    /// Encoding of the rendered page. Default: JPEG, quality 75.
    pub format: RasterFormat,

    /// User password for encrypted PDFs.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 2500,
            format: RasterFormat::default(),
            password: None,
        }
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Serialised form of [`RenderConfig`], validated through the builder.
#[derive(Deserialize)]
struct RenderConfigFields {
    #[serde(default = "default_dpi")]
    dpi: u32,
    #[serde(default = "default_max_rendered_pixels")]
    max_rendered_pixels: u32,
    #[serde(default)]
    format: RasterFormat,
    #[serde(default)]
    password: Option<String>,
}

fn default_dpi() -> u32 {
    RenderConfig::default().dpi
}

fn default_max_rendered_pixels() -> u32 {
    RenderConfig::default().max_rendered_pixels
}

impl TryFrom<RenderConfigFields> for RenderConfig {
    type Error = AtsError;

    fn try_from(f: RenderConfigFields) -> Result<Self, Self::Error> {
        let mut builder = RenderConfig::builder()
            .dpi(f.dpi)
            .max_rendered_pixels(f.max_rendered_pixels)
            .format(f.format);
        if let Some(pwd) = f.password {
            builder = builder.password(pwd);
        }
        builder.build()
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn format(mut self, format: RasterFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Shorthand for `format(RasterFormat::Jpeg { quality })`.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.format = RasterFormat::Jpeg { quality };
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, AtsError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(AtsError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if let RasterFormat::Jpeg { quality } = c.format {
            if quality == 0 || quality > 100 {
                return Err(AtsError::InvalidConfig(format!(
                    "JPEG quality must be 1–100, got {quality}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Model ────────────────────────────────────────────────────────────────

/// Identity and credential of the remote generative model.
///
/// A missing `api_key` is not a build error: rendering works without one,
/// and the first dispatch fails with [`AtsError::RemoteCallFailed`].
#[derive(Clone)]
pub struct ModelConfig {
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: Option<String>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// REST base URL, without a trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Sampling temperature. `None` leaves the model's default in place.
    pub temperature: Option<f32>,

    /// Cap on generated tokens. `None` leaves the model's default in place.
    pub max_output_tokens: Option<u32>,

    /// Client-side timeout for one call, in seconds. Default: 120.
    pub api_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_output_tokens: None,
            api_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ModelConfig {
    /// Create a new builder for `ModelConfig`.
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read the credential and model identity from the process environment.
    ///
    /// `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) supplies the key, `GEMINI_MODEL`
    /// and `GEMINI_BASE_URL` override the defaults. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ModelConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = Self {
            api_key: var(API_KEY_ENV).or_else(|| var(API_KEY_FALLBACK_ENV)),
            ..Self::default()
        };
        if let Some(model) = var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(url) = var("GEMINI_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config
    }
}

/// Builder for [`ModelConfig`].
#[derive(Debug)]
pub struct ModelConfigBuilder {
    config: ModelConfig,
}

impl ModelConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ModelConfig, AtsError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AtsError::InvalidConfig("Model name must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(AtsError::InvalidConfig(format!(
                "Base URL must be HTTP or HTTPS, got '{}'",
                c.base_url
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(AtsError::InvalidConfig("API timeout must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}
