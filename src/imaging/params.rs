//! Parameter types for image operations.
//!
//! These describe *what* to encode, not *how*. The transcoder
//! ([`operations`](super::operations)) decides the sequence of attempts; the
//! [`backend`](super::backend) does the pixel work for each one.
//!
//! - [`Quality`]: JPEG quality in percent (1–100, default 90). Clamped on construction.
//! - [`EncodeParams`]: one encode attempt: target dimensions and quality.
//! - [`ImageQuality`]: the export-level setting that picks a byte budget.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lossy encoding quality in percent (1-100).
///
/// Kept as an integer so the 0.9 → 0.8 → … → 0.5 ladder steps exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `0.0..=1.0` fraction used in logs and the UI.
    pub fn as_fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// A single encode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Export image quality setting.
///
/// | Setting | Byte budget per embedded scene image |
/// |---|---|
/// | `native` | none, images are kept as imported |
/// | `optimized` | 1 MiB |
/// | `reduced` | 256 KiB |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Native,
    #[default]
    Optimized,
    Reduced,
}

impl ImageQuality {
    /// Byte budget, or `None` when images are not transcoded.
    pub fn max_bytes(self) -> Option<usize> {
        match self {
            ImageQuality::Native => None,
            ImageQuality::Optimized => Some(1024 * 1024),
            ImageQuality::Reduced => Some(256 * 1024),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageQuality::Native => "native",
            ImageQuality::Optimized => "optimized",
            ImageQuality::Reduced => "reduced",
        }
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(ImageQuality::Native),
            "optimized" => Ok(ImageQuality::Optimized),
            "reduced" => Ok(ImageQuality::Reduced),
            other => Err(format!(
                "unknown image quality '{other}' (expected native, optimized or reduced)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
        assert_eq!(Quality::default().as_fraction(), 0.9);
    }

    #[test]
    fn image_quality_budgets() {
        assert_eq!(ImageQuality::Native.max_bytes(), None);
        assert_eq!(ImageQuality::Optimized.max_bytes(), Some(1_048_576));
        assert_eq!(ImageQuality::Reduced.max_bytes(), Some(262_144));
    }

    #[test]
    fn image_quality_parses_lowercase_names() {
        assert_eq!("reduced".parse::<ImageQuality>(), Ok(ImageQuality::Reduced));
        assert!("best".parse::<ImageQuality>().is_err());
    }
}
