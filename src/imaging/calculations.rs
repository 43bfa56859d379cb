//! Pure calculation functions for the transcoding ladder.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{EncodeParams, Quality};

/// Quality is lowered in these steps while it stays above [`QUALITY_FLOOR`].
pub const QUALITY_STEP: u32 = 10;

/// Once quality reaches this value, attempts shrink dimensions instead.
pub const QUALITY_FLOOR: u32 = 50;

/// Dimension scale applied per shrinking attempt.
pub const SHRINK_FACTOR: f64 = 0.8;

/// Scale both dimensions by [`SHRINK_FACTOR`], rounding down.
///
/// Never returns a zero dimension.
///
/// ```
/// # use panotour::imaging::shrink_dimensions;
/// assert_eq!(shrink_dimensions((4000, 2000)), (3200, 1600));
/// assert_eq!(shrink_dimensions((1, 1)), (1, 1));
/// ```
pub fn shrink_dimensions(dims: (u32, u32)) -> (u32, u32) {
    let (w, h) = dims;
    let scale = |v: u32| ((v as f64 * SHRINK_FACTOR).floor() as u32).max(1);
    (scale(w), scale(h))
}

/// Parameters for the attempt after `current` missed its budget.
///
/// Quality drops first (less visible than losing resolution); from the
/// floor onward the image is downsampled instead.
pub fn next_attempt(current: EncodeParams) -> EncodeParams {
    if current.quality.value() > QUALITY_FLOOR {
        EncodeParams {
            quality: Quality::new(current.quality.value() - QUALITY_STEP),
            ..current
        }
    } else {
        let (width, height) = shrink_dimensions((current.width, current.height));
        EncodeParams {
            width,
            height,
            ..current
        }
    }
}

/// Approximate binary size of a base64 payload: `ceil(len * 0.75)`.
///
/// Padding is not subtracted, so this is at least the true decoded size.
pub fn approx_decoded_len(base64_len: usize) -> usize {
    (base64_len * 3).div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: u32, height: u32, quality: u32) -> EncodeParams {
        EncodeParams {
            width,
            height,
            quality: Quality::new(quality),
        }
    }

    #[test]
    fn shrink_preserves_aspect() {
        assert_eq!(shrink_dimensions((8000, 4000)), (6400, 3200));
        assert_eq!(shrink_dimensions((1001, 333)), (800, 266));
    }

    #[test]
    fn shrink_never_hits_zero() {
        assert_eq!(shrink_dimensions((1, 3)), (1, 2));
    }

    #[test]
    fn quality_drops_before_dimensions() {
        assert_eq!(next_attempt(params(100, 50, 90)), params(100, 50, 80));
        assert_eq!(next_attempt(params(100, 50, 60)), params(100, 50, 50));
    }

    #[test]
    fn dimensions_shrink_at_floor() {
        assert_eq!(next_attempt(params(100, 50, 50)), params(80, 40, 50));
        assert_eq!(next_attempt(params(80, 40, 50)), params(64, 32, 50));
    }

    #[test]
    fn ladder_from_default() {
        let mut p = params(1000, 500, 90);
        let mut seen = vec![p];
        for _ in 0..6 {
            p = next_attempt(p);
            seen.push(p);
        }
        let qualities: Vec<u32> = seen.iter().map(|p| p.quality.value()).collect();
        assert_eq!(qualities, vec![90, 80, 70, 60, 50, 50, 50]);
        assert_eq!((seen[6].width, seen[6].height), (640, 320));
    }

    #[test]
    fn approx_len_rounds_up() {
        assert_eq!(approx_decoded_len(0), 0);
        assert_eq!(approx_decoded_len(4), 3);
        assert_eq!(approx_decoded_len(5), 4);
        assert_eq!(approx_decoded_len(1_398_104), 1_048_578);
    }
}
