//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the transcoder
//! needs: decode bytes into pixels, and encode pixels as JPEG at a given
//! size and quality.
//!
//! The production implementation,
//! [`RustBackend`](super::rust_backend::RustBackend), is pure Rust, built on
//! the `image` crate.

use super::params::EncodeParams;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a base64 data URI")]
    InvalidDataUri,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve every scene of an export on the rayon
/// pool.
pub trait ImageBackend: Sync {
    /// Decode an encoded image (JPEG, PNG, WebP).
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Encode `image` as JPEG, resampled to `params.width × params.height`.
    fn encode_jpeg(
        &self,
        image: &DynamicImage,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records encode attempts and returns canned sizes.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        /// Byte lengths returned by successive encodes; the last one repeats.
        pub encoded_sizes: Mutex<Vec<usize>>,
        pub decoded: Mutex<Option<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Encode {
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_encoded_sizes(sizes: Vec<usize>) -> Self {
            Self {
                encoded_sizes: Mutex::new(sizes),
                ..Self::default()
            }
        }

        pub fn decoding_to(dims: Dimensions) -> Self {
            Self {
                decoded: Mutex::new(Some(dims)),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encodes(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| matches!(op, RecordedOp::Encode { .. }))
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));
            let dims = self
                .decoded
                .lock()
                .unwrap()
                .ok_or_else(|| BackendError::DecodeFailed("No mock dimensions".to_string()))?;
            Ok(DynamicImage::new_rgb8(dims.width, dims.height))
        }

        fn encode_jpeg(
            &self,
            _image: &DynamicImage,
            params: &EncodeParams,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            let mut sizes = self.encoded_sizes.lock().unwrap();
            let size = if sizes.len() > 1 {
                sizes.remove(0)
            } else {
                sizes.first().copied().unwrap_or(0)
            };
            Ok(vec![0u8; size])
        }
    }

    #[test]
    fn mock_records_encode() {
        let backend = MockBackend::with_encoded_sizes(vec![10, 20]);
        let image = DynamicImage::new_rgb8(4, 2);
        let params = EncodeParams {
            width: 4,
            height: 2,
            quality: Quality::new(90),
        };

        assert_eq!(backend.encode_jpeg(&image, &params).unwrap().len(), 10);
        assert_eq!(backend.encode_jpeg(&image, &params).unwrap().len(), 20);
        assert_eq!(backend.encode_jpeg(&image, &params).unwrap().len(), 20);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(
            &ops[0],
            RecordedOp::Encode {
                width: 4,
                height: 2,
                quality: 90
            }
        ));
    }

    #[test]
    fn mock_decode_without_dimensions_fails() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.decode(b"abc"),
            Err(BackendError::DecodeFailed(_))
        ));
        assert_eq!(backend.get_operations(), vec![RecordedOp::Decode(3)]);
    }
}
