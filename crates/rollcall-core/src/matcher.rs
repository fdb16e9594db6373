//! Pixel-norm face matching.
//!
//! This is the source system's placeholder "recognition": a raw L2 pixel
//! norm against each stored sample, gated on exact dimension equality. It is
//! deliberately not a biometric algorithm and is kept as-is for behavioral
//! compatibility; swapping in a real feature-based matcher is a separate,
//! explicit decision.

use crate::types::{FaceSample, PersonId};

/// L2 norm below which two equally sized samples are considered the same face.
const DEFAULT_NORM_THRESHOLD: f64 = 1000.0;

/// Strategy for deciding which registered person, if any, a probe sample is.
pub trait Matcher {
    /// Gallery entries are visited in the order given; the first satisfying
    /// entry wins. `None` means no match — never an error.
    fn best_match(&self, probe: &FaceSample, gallery: &[(PersonId, &FaceSample)])
        -> Option<PersonId>;
}

/// Matcher comparing aggregate pixel intensity difference against a fixed
/// threshold. Entries whose dimensions differ from the probe are skipped
/// regardless of content.
#[derive(Debug, Clone)]
pub struct PixelNormMatcher {
    pub threshold: f64,
}

impl Default for PixelNormMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_NORM_THRESHOLD,
        }
    }
}

impl Matcher for PixelNormMatcher {
    fn best_match(
        &self,
        probe: &FaceSample,
        gallery: &[(PersonId, &FaceSample)],
    ) -> Option<PersonId> {
        for (id, reference) in gallery {
            if reference.width != probe.width || reference.height != probe.height {
                continue;
            }
            if pixel_norm(&probe.data, &reference.data) < self.threshold {
                return Some(*id);
            }
        }
        None
    }
}

/// Square root of the sum of squared per-pixel differences.
fn pixel_norm(a: &[u8], b: &[u8]) -> f64 {
    let sum_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&pa, &pb)| {
            let d = pa as f64 - pb as f64;
            d * d
        })
        .sum();
    sum_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fill: u8, width: u32, height: u32) -> FaceSample {
        FaceSample::from_raw(vec![fill; (width * height) as usize], width, height)
    }

    #[test]
    fn test_pixel_norm_zero_for_identical() {
        assert_eq!(pixel_norm(&[1, 2, 3], &[1, 2, 3]), 0.0);
    }

    #[test]
    fn test_pixel_norm_uniform_difference() {
        // 100 pixels differing by 5 each: sqrt(100 * 25) = 50
        let a = vec![10u8; 100];
        let b = vec![15u8; 100];
        assert!((pixel_norm(&a, &b) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_duplicate_matches() {
        let reference = sample(128, 40, 40);
        let probe = reference.clone();
        let gallery = [(7u32, &reference)];

        let matcher = PixelNormMatcher::default();
        assert_eq!(matcher.best_match(&probe, &gallery), Some(7));
    }

    #[test]
    fn test_dimension_mismatch_never_matches() {
        // Identical content, different shape: 1600 pixels as 40x40 vs 80x20.
        let reference = sample(128, 40, 40);
        let probe = sample(128, 80, 20);
        let gallery = [(7u32, &reference)];

        let matcher = PixelNormMatcher::default();
        assert_eq!(matcher.best_match(&probe, &gallery), None);
    }

    #[test]
    fn test_norm_above_threshold_is_no_match() {
        // 100x100 window, uniform difference of 11: norm = 11 * 100 = 1100
        let reference = sample(100, 100, 100);
        let probe = sample(111, 100, 100);
        let gallery = [(1u32, &reference)];

        let matcher = PixelNormMatcher::default();
        assert_eq!(matcher.best_match(&probe, &gallery), None);
    }

    #[test]
    fn test_norm_below_threshold_matches() {
        // Uniform difference of 9: norm = 900 < 1000
        let reference = sample(100, 100, 100);
        let probe = sample(109, 100, 100);
        let gallery = [(1u32, &reference)];

        let matcher = PixelNormMatcher::default();
        assert_eq!(matcher.best_match(&probe, &gallery), Some(1));
    }

    #[test]
    fn test_first_satisfying_entry_wins() {
        // Both entries are within the threshold; insertion order decides.
        let first = sample(100, 10, 10);
        let second = sample(101, 10, 10);
        let probe = sample(100, 10, 10);
        let gallery = [(5u32, &first), (9u32, &second)];

        let matcher = PixelNormMatcher::default();
        assert_eq!(matcher.best_match(&probe, &gallery), Some(5));
    }

    #[test]
    fn test_mismatched_entries_are_skipped_not_fatal() {
        let wrong_shape = sample(100, 20, 20);
        let right = sample(100, 10, 10);
        let probe = sample(100, 10, 10);
        let gallery = [(5u32, &wrong_shape), (9u32, &right)];

        let matcher = PixelNormMatcher::default();
        assert_eq!(matcher.best_match(&probe, &gallery), Some(9));
    }

    #[test]
    fn test_empty_gallery() {
        let probe = sample(0, 10, 10);
        let matcher = PixelNormMatcher::default();
        assert_eq!(matcher.best_match(&probe, &[]), None);
    }
}
