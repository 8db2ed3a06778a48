use anyhow::{Result, anyhow};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

use crate::types::Frame;

/// Byte layout of a raw camera buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Nv12,
    Yuyv,
    Mjpeg,
    Rgb,
    Bgr,
    Gray,
}

/// Decodes a camera buffer to RGBA and flips it left-to-right so the preview
/// behaves like a mirror.
pub fn to_mirrored_frame(layout: PixelLayout, data: &[u8], width: u32, height: u32) -> Result<Frame> {
    let (mut rgba, width, height) = match layout {
        PixelLayout::Nv12 => (nv12_to_rgba(data, width, height)?, width, height),
        PixelLayout::Yuyv => (yuyv_to_rgba(data, width, height)?, width, height),
        PixelLayout::Mjpeg => mjpeg_to_rgba(data, width, height)?,
        PixelLayout::Rgb => (packed_to_rgba(data, width, height, 3, [0, 1, 2])?, width, height),
        PixelLayout::Bgr => (packed_to_rgba(data, width, height, 3, [2, 1, 0])?, width, height),
        PixelLayout::Gray => (packed_to_rgba(data, width, height, 1, [0, 0, 0])?, width, height),
    };

    mirror_horizontal(&mut rgba, width);
    Ok(Frame::new(rgba, width, height))
}

pub fn mirror_horizontal(rgba: &mut [u8], width: u32) {
    let stride = width as usize * 4;
    if stride == 0 {
        return;
    }

    rgba.par_chunks_exact_mut(stride).for_each(|row| {
        let pixels = width as usize;
        for x in 0..pixels / 2 {
            let (left, right) = row.split_at_mut((pixels - x - 1) * 4);
            left[x * 4..x * 4 + 4].swap_with_slice(&mut right[..4]);
        }
    });
}

fn check_len(label: &str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(anyhow!(
            "{label} buffer too small: got {}, expected {expected}",
            data.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_len = width as usize * height as usize;
    let uv_len = y_len / 2;
    check_len("NV12", data, y_len + uv_len)?;

    let image = YuvBiPlanarImage {
        y_plane: &data[..y_len],
        y_stride: width,
        uv_plane: &data[y_len..y_len + uv_len],
        uv_stride: width,
        width,
        height,
    };

    let mut rgba = vec![0u8; y_len * 4];
    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let pixels = width as usize * height as usize;
    check_len("YUYV", data, pixels * 2)?;

    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    let mut rgba = vec![0u8; pixels * 4];
    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

// MJPEG frames carry their own size; trust the decoder over the negotiated one.
fn mjpeg_to_rgba(data: &[u8], width: u32, height: u32) -> Result<(Vec<u8>, u32, u32)> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    let (width, height) = decoder
        .info()
        .map(|info| (info.width as u32, info.height as u32))
        .unwrap_or((width, height));
    check_len("MJPEG", &rgba, width as usize * height as usize * 4)?;

    Ok((rgba, width, height))
}

/// Expands 1- or 3-byte pixels to RGBA, picking source channels by `order`.
fn packed_to_rgba(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    order: [usize; 3],
) -> Result<Vec<u8>> {
    let pixels = width as usize * height as usize;
    check_len("raw", data, pixels * bytes_per_pixel)?;

    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_exact_mut(4)
        .zip(data.par_chunks_exact(bytes_per_pixel))
        .for_each(|(dst, src)| {
            dst[0] = src[order[0]];
            dst[1] = src[order[1]];
            dst[2] = src[order[2]];
            dst[3] = 255;
        });

    Ok(rgba)
}
