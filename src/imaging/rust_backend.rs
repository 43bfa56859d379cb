//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Sniff MIME type | `image::guess_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::params::EncodeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

/// Formats whose decoders are compiled in.
const DECODABLE: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// MIME type of an encoded image, sniffed from its magic bytes.
///
/// Returns `None` for formats this build cannot decode.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .filter(|format| DECODABLE.contains(format))
        .map(|format| format.to_mime_type())
}

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::DecodeFailed(e.to_string()))
    }

    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        let resized = if (image.width(), image.height()) == (params.width, params.height) {
            None
        } else {
            Some(image.resize_exact(params.width, params.height, FilterType::Lanczos3))
        };
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(resized.as_ref().unwrap_or(image).to_rgb8());

        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, params.quality.value() as u8);
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::EncodeFailed(format!("JPEG encode failed: {}", e)))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::test_helpers::{noise_image, png_bytes};

    #[test]
    fn decode_reads_png() {
        let backend = RustBackend::new();
        let image = backend.decode(&png_bytes(40, 20)).unwrap();
        assert_eq!((image.width(), image.height()), (40, 20));
    }

    #[test]
    fn decode_rejects_garbage() {
        let backend = RustBackend::new();
        assert!(matches!(
            backend.decode(b"not an image"),
            Err(BackendError::DecodeFailed(_))
        ));
    }

    #[test]
    fn encode_resizes_to_requested_dimensions() {
        let backend = RustBackend::new();
        let source = noise_image(64, 32);
        let jpeg = backend
            .encode_jpeg(
                &source,
                &EncodeParams {
                    width: 32,
                    height: 16,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        assert_eq!(sniff_mime_type(&jpeg), Some("image/jpeg"));
        let decoded = backend.decode(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn lower_quality_produces_fewer_bytes() {
        let backend = RustBackend::new();
        let source = noise_image(128, 64);
        let at = |q| {
            backend
                .encode_jpeg(
                    &source,
                    &EncodeParams {
                        width: 128,
                        height: 64,
                        quality: Quality::new(q),
                    },
                )
                .unwrap()
                .len()
        };
        assert!(at(30) < at(95));
    }

    #[test]
    fn sniff_detects_png() {
        assert_eq!(sniff_mime_type(&png_bytes(2, 2)), Some("image/png"));
        assert_eq!(sniff_mime_type(b"plain text"), None);
    }
}
