//! rollcall-core — Face detection and matching for the attendance tool.
//!
//! Detection is a staged cascade classifier evaluated over integral images;
//! matching is a raw pixel-norm comparison against registered samples.

pub mod detector;
pub mod matcher;
pub mod types;

pub use detector::{CascadeDetector, DetectParams, DetectorError};
pub use matcher::{Matcher, PixelNormMatcher};
pub use types::{FaceRegion, FaceSample, Person, PersonId, Role};
