use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ndarray::Array4;
use ort::{session::Session, value::Tensor};

use super::{
    LandmarkDetector,
    common::{self, PixelRange},
};
use crate::{
    config::FACE_SCORE_THRESHOLD,
    types::{Frame, LandmarkSet, face},
};

const DETECTOR_INPUT_W: u32 = 320;
const DETECTOR_INPUT_H: u32 = 240;
const MESH_INPUT_SIZE: u32 = 192;
// The mesh model expects some forehead and chin around the detector's box.
const MESH_CROP_SCALE: f32 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq)]
struct FaceBox {
    bbox: [f32; 4],
    score: f32,
}

impl FaceBox {
    fn center(&self) -> (f32, f32) {
        (
            (self.bbox[0] + self.bbox[2]) * 0.5,
            (self.bbox[1] + self.bbox[3]) * 0.5,
        )
    }

    fn side(&self) -> f32 {
        (self.bbox[2] - self.bbox[0]).max(self.bbox[3] - self.bbox[1])
    }
}

/// UltraFace box detection followed by a 468-point face mesh.
pub struct FaceDetector {
    detector: Session,
    mesh: Session,
}

impl FaceDetector {
    pub fn new(detector_model_path: &Path, mesh_model_path: &Path) -> Result<Self> {
        let detector = common::load_session(detector_model_path)?;
        let mesh = common::load_session(mesh_model_path)?;

        log::info!(
            "face detector ready using {} and mesh {}",
            detector_model_path.display(),
            mesh_model_path.display()
        );

        Ok(Self { detector, mesh })
    }

    fn locate(&mut self, frame: &Frame) -> Result<Option<FaceBox>> {
        let input = prepare_planar(frame, DETECTOR_INPUT_W, DETECTOR_INPUT_H)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .detector
            .run(ort::inputs![tensor])
            .context("failed to run face detector session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "face detector returned {} outputs, expected scores and boxes",
                outputs.len()
            ));
        }

        let scores: Vec<f32> = outputs[0].try_extract_array::<f32>()?.iter().copied().collect();
        let boxes: Vec<f32> = outputs[1].try_extract_array::<f32>()?.iter().copied().collect();

        Ok(best_face(
            &scores,
            &boxes,
            FACE_SCORE_THRESHOLD,
            frame.width,
            frame.height,
        ))
    }
}

impl LandmarkDetector for FaceDetector {
    fn name(&self) -> &'static str {
        "face"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        let Some(face_box) = self.locate(frame)? else {
            return Ok(None);
        };
        log::trace!("face at {:?} ({:.2})", face_box.bbox, face_box.score);

        let (input, transform) = common::prepare_rotated_crop(
            frame,
            face_box.center(),
            face_box.side() * MESH_CROP_SCALE,
            0.0,
            MESH_INPUT_SIZE,
            PixelRange::Signed,
        )?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .mesh
            .run(ort::inputs![tensor])
            .context("failed to run face mesh session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("face mesh returned no outputs"));
        }

        let coords: Vec<f32> = outputs[0].try_extract_array::<f32>()?.iter().copied().collect();
        let landmarks = common::decode_landmarks(&coords, face::COUNT)?;
        let projected = common::project_landmarks(&landmarks, &transform);

        Ok(Some(LandmarkSet::from_pixels(
            &projected,
            frame.width,
            frame.height,
        )))
    }
}

/// Stretches the frame to `width`x`height` and lays it out as NCHW with
/// UltraFace's `(p - 127) / 128` normalization.
fn prepare_planar(frame: &Frame, width: u32, height: u32) -> Result<Array4<f32>> {
    common::check_frame(frame)?;
    let resized = common::resize_rgba(frame, width, height)?;

    let plane = width as usize * height as usize;
    let mut data = vec![0.0f32; plane * 3];
    for (i, px) in resized.chunks_exact(4).enumerate() {
        for c in 0..3 {
            data[c * plane + i] = (px[c] as f32 - 127.0) / 128.0;
        }
    }

    Array4::from_shape_vec((1, 3, height as usize, width as usize), data)
        .map_err(|err| anyhow!("failed to build face detector tensor: {err}"))
}

/// Picks the most confident face from UltraFace's `[bg, face]` score pairs
/// and normalized corner-form boxes, scaled to frame pixels.
fn best_face(
    scores: &[f32],
    boxes: &[f32],
    threshold: f32,
    frame_w: u32,
    frame_h: u32,
) -> Option<FaceBox> {
    let (w, h) = (frame_w as f32, frame_h as f32);

    scores
        .chunks_exact(2)
        .zip(boxes.chunks_exact(4))
        .filter(|(score, _)| score[1] > threshold)
        .max_by(|a, b| a.0[1].total_cmp(&b.0[1]))
        .map(|(score, bbox)| FaceBox {
            bbox: [
                (bbox[0] * w).clamp(0.0, w),
                (bbox[1] * h).clamp(0.0, h),
                (bbox[2] * w).clamp(0.0, w),
                (bbox[3] * h).clamp(0.0, h),
            ],
            score: score[1],
        })
        .filter(|face| face.side() > 0.0)
}
