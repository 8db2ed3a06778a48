mod common;
mod face;
mod hand;
mod palm;

use anyhow::Result;

use crate::types::{Frame, LandmarkSet};

pub use face::FaceDetector;
pub use hand::HandDetector;

/// A source of landmarks for a single hand or face in a frame.
pub trait LandmarkDetector {
    fn name(&self) -> &'static str;

    /// Returns `None` when nothing was found in the frame.
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>>;
}

/// Runs a detector, treating a failed inference as "nothing found" for this
/// frame.
pub fn detect_or_skip(detector: &mut dyn LandmarkDetector, frame: &Frame) -> Option<LandmarkSet> {
    match detector.detect(frame) {
        Ok(landmarks) => landmarks,
        Err(err) => {
            log::warn!("{} detection failed: {err:?}", detector.name());
            None
        }
    }
}
