//! rollcall-hw — Webcam capture for the attendance tool.
//!
//! V4L2-based camera access producing grayscale frames for the detector.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, CameraStream, PixelFormat};
pub use frame::Frame;
