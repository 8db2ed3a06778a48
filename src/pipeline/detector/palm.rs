use std::{cmp::Ordering, f32::consts::PI, path::Path};

use anyhow::{Context, Result, anyhow};
use ort::{session::Session, value::Tensor};

use super::common::{LetterboxInfo, load_session, prepare_letterboxed};
use crate::types::Frame;

pub const PALM_INPUT_SIZE: u32 = 192;
const PALM_KEYPOINTS: usize = 7;
// Feature-map strides of the palm model; consecutive equal strides share a grid.
const ANCHOR_STRIDES: [u32; 4] = [8, 16, 16, 16];
const ANCHORS_PER_LAYER: usize = 2;

#[derive(Clone, Debug)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: crate::config::PALM_SCORE_THRESHOLD,
            nms_threshold: 0.3,
            top_k: 1,
        }
    }
}

/// A detected palm in frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PalmRegion {
    pub bbox: [f32; 4],
    pub keypoints: Vec<(f32, f32)>,
    pub score: f32,
}

pub struct PalmDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    cfg: PalmDetectorConfig,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self> {
        let session = load_session(model_path)
            .with_context(|| format!("failed to load palm detector from {}", model_path.display()))?;

        Ok(Self {
            session,
            anchors: generate_anchors(PALM_INPUT_SIZE),
            cfg,
        })
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmRegion>> {
        let (input, letterbox) = prepare_letterboxed(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;

        let feature_dim = *boxes
            .shape()
            .last()
            .ok_or_else(|| anyhow!("palm box output has no dimensions"))?;
        let boxes: Vec<f32> = boxes.iter().copied().collect();
        let scores: Vec<f32> = scores.iter().copied().collect();

        decode_palms(
            &boxes,
            feature_dim,
            &scores,
            &self.anchors,
            &letterbox,
            &self.cfg,
        )
    }
}

/// SSD anchor centres for the MediaPipe palm model, in [0,1] input space.
pub fn generate_anchors(input_size: u32) -> Vec<[f32; 2]> {
    let mut anchors = Vec::new();
    let mut layer = 0;
    while layer < ANCHOR_STRIDES.len() {
        let stride = ANCHOR_STRIDES[layer];
        let mut repeats = 0;
        while layer < ANCHOR_STRIDES.len() && ANCHOR_STRIDES[layer] == stride {
            repeats += ANCHORS_PER_LAYER;
            layer += 1;
        }

        let grid = input_size.div_ceil(stride);
        for y in 0..grid {
            for x in 0..grid {
                let center = [
                    (x as f32 + 0.5) / grid as f32,
                    (y as f32 + 0.5) / grid as f32,
                ];
                anchors.extend(std::iter::repeat_n(center, repeats));
            }
        }
    }
    anchors
}

fn decode_palms(
    boxes: &[f32],
    feature_dim: usize,
    scores: &[f32],
    anchors: &[[f32; 2]],
    letterbox: &LetterboxInfo,
    cfg: &PalmDetectorConfig,
) -> Result<Vec<PalmRegion>> {
    if feature_dim < 4 + PALM_KEYPOINTS * 2 {
        return Err(anyhow!("palm box feature dimension too small: {feature_dim}"));
    }

    let count = anchors
        .len()
        .min(scores.len())
        .min(boxes.len() / feature_dim);
    let pad_bias_x = letterbox.pad_x / letterbox.scale;
    let pad_bias_y = letterbox.pad_y / letterbox.scale;
    let scale = letterbox.orig_w.max(letterbox.orig_h) as f32;
    let input = PALM_INPUT_SIZE as f32;
    let to_frame = |anchor: [f32; 2], dx: f32, dy: f32| {
        (
            (dx / input + anchor[0]) * scale - pad_bias_x,
            (dy / input + anchor[1]) * scale - pad_bias_y,
        )
    };

    let mut candidates = Vec::new();
    for (idx, &anchor) in anchors.iter().enumerate().take(count) {
        let score = sigmoid(scores[idx]);
        if score < cfg.score_threshold {
            continue;
        }

        let raw = &boxes[idx * feature_dim..(idx + 1) * feature_dim];
        let (cx, cy) = to_frame(anchor, raw[0], raw[1]);
        let half_w = raw[2] / input * scale / 2.0;
        let half_h = raw[3] / input * scale / 2.0;
        if half_w <= 0.0 || half_h <= 0.0 {
            continue;
        }

        let max_x = letterbox.orig_w.saturating_sub(1) as f32;
        let max_y = letterbox.orig_h.saturating_sub(1) as f32;
        let bbox = [
            (cx - half_w).clamp(0.0, max_x),
            (cy - half_h).clamp(0.0, max_y),
            (cx + half_w).clamp(0.0, max_x),
            (cy + half_h).clamp(0.0, max_y),
        ];

        let keypoints = (0..PALM_KEYPOINTS)
            .map(|k| to_frame(anchor, raw[4 + k * 2], raw[5 + k * 2]))
            .collect();

        candidates.push(PalmRegion {
            bbox,
            keypoints,
            score,
        });
    }

    Ok(nms(candidates, cfg.nms_threshold, cfg.top_k))
}

pub fn pick_primary_region(regions: &[PalmRegion]) -> Option<&PalmRegion> {
    regions
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
}

/// Centre, side and rotation of the square crop fed to the hand landmark
/// model.
pub fn crop_from_palm(region: &PalmRegion) -> ((f32, f32), f32, f32) {
    let center = if region.keypoints.is_empty() {
        (
            (region.bbox[0] + region.bbox[2]) * 0.5,
            (region.bbox[1] + region.bbox[3]) * 0.5,
        )
    } else {
        let n = region.keypoints.len() as f32;
        let (sx, sy) = region
            .keypoints
            .iter()
            .fold((0.0_f32, 0.0_f32), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        (sx / n, sy / n)
    };

    let base = (region.bbox[2] - region.bbox[0])
        .abs()
        .max((region.bbox[3] - region.bbox[1]).abs());
    let keypoint_span = region
        .keypoints
        .iter()
        .fold(None, |acc: Option<(f32, f32, f32, f32)>, &(x, y)| {
            Some(match acc {
                None => (x, x, y, y),
                Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
            })
        })
        .map(|(x0, x1, y0, y1)| (x1 - x0).max(y1 - y0))
        .unwrap_or(0.0);
    // Fingers extend well past the palm box.
    let side = base.max(keypoint_span).max(80.0) * 2.4;

    (center, side, estimate_orientation(region))
}

// Principal axis of the palm keypoints, rotated so fingers point up.
fn estimate_orientation(region: &PalmRegion) -> f32 {
    let points = &region.keypoints;
    if points.len() < 2 {
        return 0.0;
    }

    let n = points.len() as f32;
    let (mx, my) = points
        .iter()
        .fold((0.0_f32, 0.0_f32), |acc, (x, y)| (acc.0 + x, acc.1 + y));
    let mean = (mx / n, my / n);

    let (mut xx, mut xy, mut yy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let dx = x - mean.0;
        let dy = y - mean.1;
        xx += dx * dx;
        xy += dx * dy;
        yy += dy * dy;
    }
    xx /= n;
    xy /= n;
    yy /= n;

    let trace = xx + yy;
    let det = xx * yy - xy * xy;
    let lambda = (trace * 0.5 + ((trace * 0.5).powi(2) - det).max(0.0).sqrt()).max(1e-6);
    let (vx, vy) = if xy.abs() > 1e-6 {
        (lambda - yy, xy)
    } else if xx >= yy {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };

    vy.atan2(vx) - PI * 0.5
}

fn nms(mut candidates: Vec<PalmRegion>, threshold: f32, top_k: usize) -> Vec<PalmRegion> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut keep: Vec<PalmRegion> = Vec::new();
    for candidate in candidates {
        if keep.len() >= top_k {
            break;
        }
        if keep
            .iter()
            .all(|kept| iou(&candidate.bbox, &kept.bbox) < threshold)
        {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }

    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
