//! PDF rasterisation: render page 1 of an uploaded document via pdfium.
//!
//! Only the first page is ever rendered, whatever the document length. For
//! a resume that page carries the headline, summary and most recent roles,
//! which is what every evaluation is based on.
//!
//! pdfium is a blocking C++ library. Callers inside an async runtime should
//! run [`render_first_page`] on a blocking thread (`spawn_blocking` or
//! `block_in_place`).

use crate::config::RenderConfig;
use crate::error::AtsError;
use crate::pipeline::encode::{encode_page, EncodedImagePart};
use crate::pipeline::input::UploadedDocument;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// Environment variable pointing at an existing pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Page 1 of a document as a bitmap.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub width: u32,
    pub height: u32,
    /// Number of pages in the source document.
    pub source_pages: usize,
    pub image: DynamicImage,
}

/// Anything that can turn an uploaded document into the image sent to the model.
pub trait DocumentRenderer: Send + Sync {
    fn render_first_page(&self, document: &UploadedDocument)
        -> Result<EncodedImagePart, AtsError>;
}

/// The production renderer, backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    config: RenderConfig,
}

impl PdfiumRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

impl DocumentRenderer for PdfiumRenderer {
    fn render_first_page(
        &self,
        document: &UploadedDocument,
    ) -> Result<EncodedImagePart, AtsError> {
        render_first_page(document, &self.config)
    }
}

/// Render page 1 of `document` and encode it for transport.
///
/// # Errors
/// - [`AtsError::NoDocumentProvided`] when the document is empty.
/// - [`AtsError::RenderingFailed`] when the bytes are not a PDF, cannot be
///   parsed, have no pages, or pdfium/encoding fails.
pub fn render_first_page(
    document: &UploadedDocument,
    config: &RenderConfig,
) -> Result<EncodedImagePart, AtsError> {
    let start = Instant::now();
    let page = rasterise_first_page(document, config)?;

    let part = encode_page(&page.image, config.format).map_err(|e| {
        rendering_failed(document, format!("Image encoding failed: {e}"))
    })?;

    info!(
        "Rendered page 1/{} of '{}' → {}x{} {} in {}ms",
        page.source_pages,
        document.name(),
        page.width,
        page.height,
        part.mime_type(),
        start.elapsed().as_millis()
    );
    Ok(part)
}

/// Rasterise page 1 of `document` without encoding it.
pub fn rasterise_first_page(
    document: &UploadedDocument,
    config: &RenderConfig,
) -> Result<RenderedPage, AtsError> {
    if document.is_empty() {
        return Err(AtsError::NoDocumentProvided);
    }
    if !document.has_pdf_magic() {
        return Err(rendering_failed(
            document,
            format!("not a PDF (first bytes: {:?})", document.magic()),
        ));
    }

    let pdfium = bind_pdfium().map_err(|e| rendering_failed(document, e))?;

    let password = config.password.as_deref();
    let pdf = pdfium
        .load_pdf_from_byte_slice(document.bytes(), password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    "wrong password".to_string()
                } else {
                    "document is encrypted and requires a password".to_string()
                }
            } else {
                format!("corrupt PDF: {err_str}")
            };
            rendering_failed(document, detail)
        })?;

    let pages = pdf.pages();
    let total_pages = pages.len() as usize;
    debug!("'{}' loaded: {} pages", document.name(), total_pages);
    if total_pages == 0 {
        return Err(rendering_failed(document, "document has no pages".to_string()));
    }

    let scale = config.dpi as f32 / POINTS_PER_INCH;
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .set_maximum_width(pixel_limit(config.max_rendered_pixels))
        .set_maximum_height(pixel_limit(config.max_rendered_pixels));

    let page = pages
        .get(0)
        .map_err(|e| rendering_failed(document, format!("page 1: {:?}", e)))?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| rendering_failed(document, format!("rasterisation of page 1: {:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page 1 of '{}' → {}x{} px at {} DPI",
        document.name(),
        image.width(),
        image.height(),
        config.dpi
    );

    Ok(RenderedPage {
        width: image.width(),
        height: image.height(),
        source_pages: total_pages,
        image,
    })
}

/// Bind to a pdfium library.
///
/// Lookup order: `PDFIUM_LIB_PATH`, the working directory, then the system
/// library path.
pub fn bind_pdfium() -> Result<Pdfium, String> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path)
            .map_err(|e| format!("failed to bind pdfium from {PDFIUM_LIB_PATH_ENV}={path}: {e:?}"))?,
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| {
                format!(
                    "pdfium library not found ({e:?}). \
                     Install libpdfium or set {PDFIUM_LIB_PATH_ENV}=/path/to/libpdfium"
                )
            })?,
    };
    Ok(Pdfium::new(bindings))
}

fn rendering_failed(document: &UploadedDocument, detail: String) -> AtsError {
    AtsError::RenderingFailed {
        document: document.name().to_string(),
        size: document.len(),
        detail,
    }
}

/// pdfium takes pixel caps as `i32`; larger limits saturate.
fn pixel_limit(px: u32) -> i32 {
    i32::try_from(px).unwrap_or(i32::MAX)
}
