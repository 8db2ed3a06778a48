use std::path::Path;

use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use rayon::prelude::*;

use crate::types::Frame;

/// Value range a model expects its RGB input in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelRange {
    /// 0.0 ..= 1.0
    Unit,
    /// -1.0 ..= 1.0
    Signed,
}

impl PixelRange {
    fn normalize(self, value: f32) -> f32 {
        match self {
            PixelRange::Unit => value / 255.0,
            PixelRange::Signed => value / 127.5 - 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

#[derive(Clone, Debug)]
pub struct CropTransform {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
    pub output_size: u32,
}

pub fn load_session(model_path: &Path) -> Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(2)?
        .commit_from_file(model_path)
        .with_context(|| format!("failed to load ORT session from {}", model_path.display()))
}

pub fn check_frame(frame: &Frame) -> Result<()> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.rgba.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected_len
        ));
    }
    Ok(())
}

/// Resizes the whole frame into a `width`x`height` RGBA buffer.
pub fn resize_rgba(frame: &Frame, width: u32, height: u32) -> Result<Vec<u8>> {
    let src = fir::images::ImageRef::new(
        frame.width,
        frame.height,
        &frame.rgba,
        fir::PixelType::U8x4,
    )?;
    let mut dst = fir::images::Image::new(width, height, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    fir::Resizer::new()
        .resize(&src, &mut dst, Some(&options))
        .context("fast resize failed")?;
    Ok(dst.into_vec())
}

/// Scales the frame to fit a `target_size` square, pads the rest with black
/// and returns an NHWC tensor in the unit range.
pub fn prepare_letterboxed(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, LetterboxInfo)> {
    check_frame(frame)?;

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;
    let resized = resize_rgba(frame, new_w, new_h)?;

    let side = target_size as usize;
    let pad_x = (side.saturating_sub(new_w as usize)) / 2;
    let pad_y = (side.saturating_sub(new_h as usize)) / 2;
    let mut tensor = vec![0.0f32; side * side * 3];

    let src_stride = new_w as usize * 4;
    tensor
        .par_chunks_exact_mut(side * 3)
        .enumerate()
        .skip(pad_y)
        .take(new_h as usize)
        .for_each(|(row, dst)| {
            let src = &resized[(row - pad_y) * src_stride..(row - pad_y + 1) * src_stride];
            for (x, px) in src.chunks_exact(4).enumerate() {
                let offset = (pad_x + x) * 3;
                dst[offset] = PixelRange::Unit.normalize(px[0] as f32);
                dst[offset + 1] = PixelRange::Unit.normalize(px[1] as f32);
                dst[offset + 2] = PixelRange::Unit.normalize(px[2] as f32);
            }
        });

    let input = Array4::<f32>::from_shape_vec((1, side, side, 3), tensor)
        .map_err(|err| anyhow!("failed to build input tensor: {err}"))?;

    Ok((
        input,
        LetterboxInfo {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            orig_w: frame.width,
            orig_h: frame.height,
        },
    ))
}

/// Samples a rotated square of side `side` centred on `center` into an
/// `output_size` NHWC tensor.
pub fn prepare_rotated_crop(
    frame: &Frame,
    center: (f32, f32),
    side: f32,
    angle: f32,
    output_size: u32,
    range: PixelRange,
) -> Result<(Array4<f32>, CropTransform)> {
    check_frame(frame)?;

    let transform = CropTransform {
        center,
        side,
        angle,
        output_size,
    };

    let size = output_size as usize;
    let mut data = vec![0.0f32; size * size * 3];
    data.par_chunks_exact_mut(size * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..size {
                let (src_x, src_y) = transform.source_point(x as f32 + 0.5, y as f32 + 0.5);
                let rgb = sample_rgb(frame, src_x, src_y);
                for c in 0..3 {
                    row[x * 3 + c] = range.normalize(rgb[c]);
                }
            }
        });

    let array = Array4::<f32>::from_shape_vec((1, size, size, 3), data)
        .map_err(|err| anyhow!("failed to build rotated crop tensor: {err}"))?;

    Ok((array, transform))
}

pub fn decode_landmarks(flat: &[f32], count: usize) -> Result<Vec<[f32; 3]>> {
    if flat.len() < count * 3 {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            count * 3
        ));
    }

    Ok(flat
        .chunks_exact(3)
        .take(count)
        .map(|chunk| [chunk[0], chunk[1], chunk[2]])
        .collect())
}

pub fn project_landmarks(landmarks: &[[f32; 3]], transform: &CropTransform) -> Vec<(f32, f32)> {
    landmarks
        .iter()
        .map(|[x, y, _z]| transform.project(*x, *y))
        .collect()
}

impl CropTransform {
    fn source_point(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.side / self.output_size as f32;
        let dx = (x - half) * scale;
        let dy = (y - half) * scale;
        let (sin, cos) = self.angle.sin_cos();
        (
            self.center.0 + dx * cos - dy * sin,
            self.center.1 + dx * sin + dy * cos,
        )
    }

    /// Maps a point in crop pixels back to frame pixels. The point is kept
    /// inside the crop but may land outside the frame when the crop does.
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let size = self.output_size as f32;
        self.source_point(x.clamp(0.0, size), y.clamp(0.0, size))
    }
}

// Bilinear sample in 0..=255; outside the frame reads as black.
fn sample_rgb(frame: &Frame, x: f32, y: f32) -> [f32; 3] {
    if x.is_nan() || y.is_nan() {
        return [0.0; 3];
    }
    let x0 = x.floor();
    let y0 = y.floor();

    let (w, h) = (frame.width as i64, frame.height as i64);
    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        let (ix, iy) = (cx as i64, cy as i64);
        if ix < 0 || iy < 0 || ix >= w || iy >= h {
            return [0.0; 3];
        }
        let idx = ((iy * w + ix) as usize) * 4;
        match frame.rgba.get(idx..idx + 3) {
            Some(px) => [px[0] as f32, px[1] as f32, px[2] as f32],
            None => [0.0; 3],
        }
    };

    let fx = x - x0;
    let fy = y - y0;
    let c00 = fetch(x0, y0);
    let c10 = fetch(x0 + 1.0, y0);
    let c01 = fetch(x0, y0 + 1.0);
    let c11 = fetch(x0 + 1.0, y0 + 1.0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    std::array::from_fn(|c| lerp(lerp(c00[c], c10[c], fx), lerp(c01[c], c11[c], fx), fy))
}
