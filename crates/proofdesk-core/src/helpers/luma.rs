// crates/proofdesk-core/src/helpers/luma.rs
//
// Brightness metrics for sampled video frames.
//
// The poster sampler in proofdesk-media rejects frames that are "black"
// (fade-ins, leaders) by comparing the mean luminance of the scaled RGBA
// frame against a threshold. The metric is the plain channel average
// (R+G+B)/3 per pixel, averaged over all pixels, alpha ignored.

use rayon::prelude::*;

/// Frames whose mean luminance is below this (0–255 scale) count as black.
pub const BLACK_FRAME_THRESHOLD: f64 = 10.0;

/// Mean of `(R+G+B)/3` over every pixel of a packed RGBA buffer.
///
/// Returns 0.0 for an empty buffer. Trailing bytes that do not form a full
/// pixel are ignored.
///
/// ```
/// use proofdesk_core::helpers::luma::mean_luminance;
/// let white = [255u8, 255, 255, 255].repeat(4);
/// assert!((mean_luminance(&white) - 255.0).abs() < 1e-9);
/// assert_eq!(mean_luminance(&[]), 0.0);
/// ```
pub fn mean_luminance(rgba: &[u8]) -> f64 {
    let pixels = rgba.len() / 4;
    if pixels == 0 {
        return 0.0;
    }
    // Sum of R+G+B fits comfortably in u64 for any frame we will ever sample.
    let sum: u64 = rgba
        .par_chunks_exact(4)
        .map(|px| px[0] as u64 + px[1] as u64 + px[2] as u64)
        .sum();
    sum as f64 / 3.0 / pixels as f64
}

/// `true` when the frame should be rejected as unrepresentative.
#[inline]
pub fn is_black_frame(luminance: f64, threshold: f64) -> bool {
    luminance < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(r: u8, g: u8, b: u8, n: usize) -> Vec<u8> {
        [r, g, b, 255].repeat(n)
    }

    #[test]
    fn black_frame_is_zero() {
        assert_eq!(mean_luminance(&solid(0, 0, 0, 16)), 0.0);
        assert!(is_black_frame(0.0, BLACK_FRAME_THRESHOLD));
    }

    #[test]
    fn channel_average_ignores_alpha() {
        let px = vec![30u8, 60, 90, 0];
        assert!((mean_luminance(&px) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn mixed_frame_averages_pixels() {
        let mut buf = solid(0, 0, 0, 2);
        buf.extend(solid(255, 255, 255, 2));
        assert!((mean_luminance(&buf) - 127.5).abs() < 1e-9);
    }

    #[test]
    fn partial_trailing_pixel_ignored() {
        let mut buf = solid(90, 90, 90, 1);
        buf.extend([255, 255]);
        assert!((mean_luminance(&buf) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!is_black_frame(BLACK_FRAME_THRESHOLD, BLACK_FRAME_THRESHOLD));
        assert!(is_black_frame(BLACK_FRAME_THRESHOLD - 0.01, BLACK_FRAME_THRESHOLD));
    }
}
