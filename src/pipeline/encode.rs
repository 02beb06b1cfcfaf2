//! Image encoding: `DynamicImage` → base64 [`EncodedImagePart`].
//!
//! Multimodal APIs take images inline as base64 inside the JSON body. The
//! part produced here is self-contained (no paths, no handles) and is the
//! only image representation that leaves the render stage.
//!
//! JPEG is the default because a resume page is mostly white space and a
//! lossy encode at quality 75 is several times smaller than PNG while text
//! stays legible at 200 DPI. PNG remains available for callers who want
//! lossless output.

use crate::config::RasterFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

/// A transport-ready image: MIME type plus base64 data.
///
/// Fields are read-only; once built for a document the part is shared as is
/// by every evaluation of that document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedImagePart {
    mime_type: String,
    data: String,
}

impl EncodedImagePart {
    /// MIME type of the decoded bytes, e.g. `image/jpeg`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Standard base64 of the encoded image, without line breaks.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Length of the base64 payload in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// Decode the payload back into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Encode a rendered page in `format` and wrap it as an [`EncodedImagePart`].
///
/// JPEG has no alpha channel, so RGBA bitmaps are flattened to RGB first.
pub fn encode_page(
    img: &DynamicImage,
    format: RasterFormat,
) -> Result<EncodedImagePart, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
        }
        RasterFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        }
    }

    let data = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} page as {} → {} bytes ({} base64)",
        img.width(),
        img.height(),
        format.mime_type(),
        buf.len(),
        data.len()
    );

    Ok(EncodedImagePart {
        mime_type: format.mime_type().to_string(),
        data,
    })
}
