//! High-level image operations.
//!
//! [`transcode`] is the one implementation of the size-budget loop. Every
//! caller that needs an image under a byte budget goes through it.
//!
//! ## The loop
//!
//! ```text
//! quality 0.9, original size
//!   encode → measure → fits or 10th attempt? → done
//!   else quality > 0.5 ? quality -= 0.1 : dimensions *= 0.8
//! ```
//!
//! The search is linear, not binary. It always terminates, and when the
//! budget is unreachable the last attempt is returned even though it is
//! still too large. Callers that care check [`Transcoded::fits`].

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{approx_decoded_len, next_attempt};
use super::data_uri;
use super::params::{EncodeParams, Quality};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use log::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Upper bound on encode passes per image.
pub const MAX_ATTEMPTS: u32 = 10;

/// Outcome of a transcode: the final attempt and how it was reached.
#[derive(Debug, Clone)]
pub struct Transcoded {
    /// `data:image/jpeg;base64,…`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub attempts: u32,
    /// Approximate encoded size (base64 length × 0.75).
    pub approx_bytes: usize,
    pub max_bytes: usize,
}

impl Transcoded {
    /// Whether the final attempt is within budget.
    pub fn fits(&self) -> bool {
        self.approx_bytes <= self.max_bytes
    }
}

/// Re-encode `image` as JPEG until it fits `max_bytes` or attempts run out.
///
/// Errors only come from the backend's encoder; an unreachable budget is
/// not an error.
pub fn transcode(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    max_bytes: usize,
) -> Result<Transcoded> {
    let Dimensions { width, height } = Dimensions::of(image);
    let mut params = EncodeParams {
        width,
        height,
        quality: Quality::default(),
    };
    let mut attempts = 0;

    loop {
        let bytes = backend.encode_jpeg(image, &params)?;
        attempts += 1;
        let payload = STANDARD.encode(&bytes);
        let approx_bytes = approx_decoded_len(payload.len());

        debug!(
            "attempt {attempts}: {approx_bytes} bytes (max {max_bytes}), {}x{}, quality {}",
            params.width,
            params.height,
            params.quality.as_fraction()
        );

        if approx_bytes <= max_bytes || attempts >= MAX_ATTEMPTS {
            return Ok(Transcoded {
                data_uri: data_uri::from_base64("image/jpeg", &payload),
                width: params.width,
                height: params.height,
                quality: params.quality,
                attempts,
                approx_bytes,
                max_bytes,
            });
        }
        params = next_attempt(params);
    }
}

/// Decode an embedded image and [`transcode`] it.
pub fn transcode_data_uri(
    backend: &impl ImageBackend,
    uri: &str,
    max_bytes: usize,
) -> Result<Transcoded> {
    let bytes = data_uri::decode(uri)?;
    let image = backend.decode(&bytes)?;
    transcode(backend, &image, max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{jpeg_data_uri, noise_image};

    fn encode_op(width: u32, height: u32, quality: u32) -> RecordedOp {
        RecordedOp::Encode {
            width,
            height,
            quality,
        }
    }

    #[test]
    fn fits_on_first_attempt() {
        let backend = MockBackend::with_encoded_sizes(vec![100_000]);
        let image = DynamicImage::new_rgb8(400, 200);

        let result = transcode(&backend, &image, 1_048_576).unwrap();

        assert_eq!(result.attempts, 1);
        assert_eq!((result.width, result.height), (400, 200));
        assert_eq!(result.quality.value(), 90);
        assert!(result.fits());
        assert_eq!(backend.encodes(), vec![encode_op(400, 200, 90)]);
    }

    #[test]
    fn lowers_quality_then_shrinks() {
        // five misses, then a hit on the first shrunk attempt
        let backend = MockBackend::with_encoded_sizes(vec![5000, 5000, 5000, 5000, 5000, 900]);
        let image = DynamicImage::new_rgb8(1000, 500);

        let result = transcode(&backend, &image, 1000).unwrap();

        assert_eq!(
            backend.encodes(),
            vec![
                encode_op(1000, 500, 90),
                encode_op(1000, 500, 80),
                encode_op(1000, 500, 70),
                encode_op(1000, 500, 60),
                encode_op(1000, 500, 50),
                encode_op(800, 400, 50),
            ]
        );
        assert_eq!(result.attempts, 6);
        assert!(result.fits());
    }

    #[test]
    fn unreachable_budget_stops_at_attempt_cap() {
        let backend = MockBackend::with_encoded_sizes(vec![10_000]);
        let image = DynamicImage::new_rgb8(1000, 500);

        let result = transcode(&backend, &image, 1).unwrap();

        assert_eq!(result.attempts, MAX_ATTEMPTS);
        assert_eq!(backend.encodes().len(), MAX_ATTEMPTS as usize);
        assert!(!result.fits());
        // qualities 90..50 on attempts 1-5, then five shrinks of 1000x500
        assert_eq!((result.width, result.height), (327, 163));
        assert!(result.data_uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn real_encoder_small_image_is_single_pass() {
        let backend = RustBackend::new();
        let image = noise_image(96, 48);

        let result = transcode(&backend, &image, 1_048_576).unwrap();

        assert_eq!(result.attempts, 1);
        assert_eq!((result.width, result.height), (96, 48));
        assert_eq!(result.quality.value(), 90);
    }

    #[test]
    fn real_encoder_converges_or_caps() {
        let backend = RustBackend::new();
        let image = noise_image(256, 128);

        let result = transcode(&backend, &image, 1).unwrap();

        assert!(result.attempts <= MAX_ATTEMPTS);
        assert!(result.width < 256);
    }

    #[test]
    fn transcode_data_uri_decodes_first() {
        let backend = RustBackend::new();
        let uri = jpeg_data_uri(64, 32);

        let result = transcode_data_uri(&backend, &uri, 1_048_576).unwrap();

        assert_eq!((result.width, result.height), (64, 32));
    }

    #[test]
    fn transcode_data_uri_rejects_external_url() {
        let backend = RustBackend::new();
        assert!(matches!(
            transcode_data_uri(&backend, "https://example.com/p.jpg", 10),
            Err(BackendError::InvalidDataUri)
        ));
    }
}
