#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod detector;
pub mod rgba_converter;

// Re-exports for convenience
#[cfg(feature = "camera-nokhwa")]
pub use camera::CameraSource;
pub use detector::{FaceDetector, HandDetector, LandmarkDetector};
