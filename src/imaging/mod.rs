//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Data URIs** | `base64` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for the quality/dimension ladder (unit testable)
//! - **Parameters**: Data structures describing an encode attempt
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`transcode`], the byte-budget loop
//! - **Data URIs**: parsing and building `data:` URIs

pub mod backend;
mod calculations;
pub mod data_uri;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{approx_decoded_len, shrink_dimensions};
pub use operations::{MAX_ATTEMPTS, Transcoded, transcode, transcode_data_uri};
pub use params::{EncodeParams, ImageQuality, Quality};
pub use rust_backend::{RustBackend, sniff_mime_type};
