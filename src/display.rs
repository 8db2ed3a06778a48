use anyhow::{Context, Result};
use fast_image_resize as fir;

use crate::{
    assets::{OverlayKind, Overlays},
    types::{Frame, FrameSignals, GestureKind},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayChoice {
    Overlay(OverlayKind),
    Camera,
}

struct DisplayRule {
    applies: fn(&FrameSignals) -> bool,
    overlay: OverlayKind,
}

// Priority order: the first rule whose predicate holds and whose overlay is
// loaded decides what is shown.
const RULES: [DisplayRule; 4] = [
    DisplayRule {
        applies: |s| s.gesture == GestureKind::IndexOnly,
        overlay: OverlayKind::Index,
    },
    DisplayRule {
        applies: |s| s.gesture == GestureKind::MiddleOnly,
        overlay: OverlayKind::Middle,
    },
    DisplayRule {
        applies: |s| s.gesture == GestureKind::ThumbOnly,
        overlay: OverlayKind::Thumb,
    },
    DisplayRule {
        applies: |s| s.gesture == GestureKind::None && s.mouth_open,
        overlay: OverlayKind::Tongue,
    },
];

pub fn select(signals: &FrameSignals, overlays: &Overlays) -> DisplayChoice {
    RULES
        .iter()
        .find(|rule| (rule.applies)(signals) && overlays.get(rule.overlay).is_some())
        .map(|rule| DisplayChoice::Overlay(rule.overlay))
        .unwrap_or(DisplayChoice::Camera)
}

/// Produces the raster for a display choice, stretching overlays to the live
/// frame size.
pub struct Compositor {
    resizer: fir::Resizer,
    options: fir::ResizeOptions,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            resizer: fir::Resizer::new(),
            options: fir::ResizeOptions::new()
                .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear)),
        }
    }

    pub fn compose(
        &mut self,
        choice: DisplayChoice,
        frame: Frame,
        overlays: &Overlays,
    ) -> Result<Frame> {
        let kind = match choice {
            DisplayChoice::Camera => return Ok(frame),
            DisplayChoice::Overlay(kind) => kind,
        };
        let Some(overlay) = overlays.get(kind) else {
            return Ok(frame);
        };

        let src = fir::images::ImageRef::new(
            overlay.width(),
            overlay.height(),
            overlay.as_raw(),
            fir::PixelType::U8x4,
        )
        .with_context(|| format!("invalid {kind} overlay buffer"))?;
        let mut dst = fir::images::Image::new(frame.width, frame.height, fir::PixelType::U8x4);
        self.resizer
            .resize(&src, &mut dst, Some(&self.options))
            .with_context(|| format!("failed to resize {kind} overlay"))?;

        Ok(Frame {
            rgba: dst.into_vec(),
            width: frame.width,
            height: frame.height,
            timestamp: frame.timestamp,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn signals(gesture: GestureKind, mouth_open: bool) -> FrameSignals {
        FrameSignals {
            gesture,
            mouth_open,
        }
    }

    fn camera_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![42; (width * height * 4) as usize], width, height)
    }

    #[test]
    fn each_gesture_picks_its_overlay() {
        let overlays = overlays(true);
        assert_eq!(
            select(&signals(GestureKind::IndexOnly, false), &overlays),
            DisplayChoice::Overlay(OverlayKind::Index)
        );
        assert_eq!(
            select(&signals(GestureKind::MiddleOnly, false), &overlays),
            DisplayChoice::Overlay(OverlayKind::Middle)
        );
        assert_eq!(
            select(&signals(GestureKind::ThumbOnly, false), &overlays),
            DisplayChoice::Overlay(OverlayKind::Thumb)
        );
    }

    #[test]
    fn hand_gesture_beats_open_mouth() {
        let overlays = overlays(true);
        for gesture in [
            GestureKind::IndexOnly,
            GestureKind::MiddleOnly,
            GestureKind::ThumbOnly,
        ] {
            let choice = select(&signals(gesture, true), &overlays);
            assert_ne!(choice, DisplayChoice::Overlay(OverlayKind::Tongue));
            assert_ne!(choice, DisplayChoice::Camera);
        }
    }

    #[test]
    fn open_mouth_alone_shows_tongue() {
        assert_eq!(
            select(&signals(GestureKind::None, true), &overlays(true)),
            DisplayChoice::Overlay(OverlayKind::Tongue)
        );
    }

    #[test]
    fn open_mouth_without_tongue_overlay_shows_camera() {
        assert_eq!(
            select(&signals(GestureKind::None, true), &overlays(false)),
            DisplayChoice::Camera
        );
    }

    #[test]
    fn nothing_detected_shows_camera() {
        assert_eq!(
            select(&signals(GestureKind::None, false), &overlays(true)),
            DisplayChoice::Camera
        );
    }

    #[test]
    fn overlay_is_stretched_to_frame_size() {
        let overlays = overlays(true);
        let mut compositor = Compositor::new();

        let out = compositor
            .compose(
                DisplayChoice::Overlay(OverlayKind::Thumb),
                camera_frame(16, 9),
                &overlays,
            )
            .unwrap();

        assert_eq!(out.dimensions(), (16, 9));
        assert_eq!(out.rgba.len(), 16 * 9 * 4);
        assert!(out.rgba.chunks_exact(4).all(|px| {
            px.iter()
                .zip(THUMB_COLOR)
                .all(|(&got, want)| got.abs_diff(want) <= 1)
        }));
    }

    #[test]
    fn camera_choice_passes_frame_through() {
        let overlays = overlays(true);
        let mut compositor = Compositor::default();
        let frame = camera_frame(3, 2);
        let expected = frame.rgba.clone();

        let out = compositor
            .compose(DisplayChoice::Camera, frame, &overlays)
            .unwrap();
        assert_eq!(out.rgba, expected);
    }
}
