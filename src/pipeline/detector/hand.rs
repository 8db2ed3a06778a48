use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::{session::Session, value::Tensor};

use super::{
    LandmarkDetector,
    common::{self, PixelRange},
    palm::{PalmDetector, PalmDetectorConfig, crop_from_palm, pick_primary_region},
};
use crate::{
    config::HAND_PRESENCE_THRESHOLD,
    types::{Frame, LandmarkSet, hand},
};

const HANDPOSE_INPUT_SIZE: u32 = 224;

/// Palm detection followed by 21-point hand landmark estimation.
pub struct HandDetector {
    handpose: Session,
    palm_detector: PalmDetector,
}

impl HandDetector {
    pub fn new(handpose_model_path: &Path, palm_model_path: &Path) -> Result<Self> {
        let handpose = common::load_session(handpose_model_path)?;
        let palm_detector = PalmDetector::new(palm_model_path, PalmDetectorConfig::default())?;

        log::info!(
            "hand detector ready using {} and palm detector {}",
            handpose_model_path.display(),
            palm_model_path.display()
        );

        Ok(Self {
            handpose,
            palm_detector,
        })
    }
}

impl LandmarkDetector for HandDetector {
    fn name(&self) -> &'static str {
        "hand"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        let palms = self.palm_detector.detect(frame)?;
        let Some(palm) = pick_primary_region(&palms) else {
            return Ok(None);
        };

        let (center, side, angle) = crop_from_palm(palm);
        let (input, transform) = common::prepare_rotated_crop(
            frame,
            center,
            side,
            angle,
            HANDPOSE_INPUT_SIZE,
            PixelRange::Unit,
        )?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .handpose
            .run(ort::inputs![tensor])
            .context("failed to run hand landmark session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "hand landmark model returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let confidence = outputs[1]
            .try_extract_array::<f32>()?
            .iter()
            .next()
            .copied()
            .unwrap_or(0.0);
        if confidence < HAND_PRESENCE_THRESHOLD {
            return Ok(None);
        }

        let coords: Vec<f32> = outputs[0].try_extract_array::<f32>()?.iter().copied().collect();
        let landmarks = common::decode_landmarks(&coords, hand::COUNT)?;
        let projected = common::project_landmarks(&landmarks, &transform);

        Ok(Some(LandmarkSet::from_pixels(
            &projected,
            frame.width,
            frame.height,
        )))
    }
}
