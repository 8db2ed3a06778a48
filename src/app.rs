use anyhow::Result;

use crate::{
    assets::Overlays,
    display::{self, Compositor, DisplayChoice},
    gesture,
    mouth,
    pipeline::detector::{LandmarkDetector, detect_or_skip},
    types::{Frame, FrameSignals, GestureKind},
};

/// Where frames come from. An error means the stream is over.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Frame>;
}

/// Where the chosen raster for each frame goes.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Polled after every presented frame.
    fn quit_requested(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    QuitRequested,
    StreamEnded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub exit: LoopExit,
    pub frames_shown: u64,
}

pub struct OverlayApp {
    hand: Box<dyn LandmarkDetector>,
    face: Option<Box<dyn LandmarkDetector>>,
    overlays: Overlays,
    compositor: Compositor,
    last_signals: FrameSignals,
}

impl OverlayApp {
    pub fn new(
        hand: Box<dyn LandmarkDetector>,
        face: Option<Box<dyn LandmarkDetector>>,
        overlays: Overlays,
    ) -> Self {
        Self {
            hand,
            face,
            overlays,
            compositor: Compositor::new(),
            last_signals: FrameSignals::default(),
        }
    }

    /// Runs hand then face detection on one frame and classifies the result.
    pub fn signals(&mut self, frame: &Frame) -> FrameSignals {
        let gesture = detect_or_skip(self.hand.as_mut(), frame)
            .map(|landmarks| gesture::classify(&landmarks))
            .unwrap_or(GestureKind::None);

        // Without a tongue overlay the mouth can never change what is shown.
        let mouth_open = match self.face.as_deref_mut() {
            Some(face) if self.overlays.has_tongue() => detect_or_skip(face, frame)
                .is_some_and(|landmarks| mouth::is_mouth_open(&landmarks)),
            _ => false,
        };

        FrameSignals {
            gesture,
            mouth_open,
        }
    }

    /// Produces the raster to show for one camera frame.
    pub fn render(&mut self, frame: Frame) -> Result<Frame> {
        let signals = self.signals(&frame);
        if signals != self.last_signals {
            log::debug!(
                "gesture: {}, mouth open: {}",
                signals.gesture.label(),
                signals.mouth_open
            );
            self.last_signals = signals;
        }

        let choice: DisplayChoice = display::select(&signals, &self.overlays);
        self.compositor.compose(choice, frame, &self.overlays)
    }

    /// Drives the capture loop until the sink asks to quit or the source runs
    /// dry. Source and sink are dropped on every return path.
    pub fn run<S, K>(&mut self, mut source: S, mut sink: K) -> Result<RunSummary>
    where
        S: FrameSource,
        K: FrameSink,
    {
        let mut frames_shown = 0;

        let exit = loop {
            let frame = match source.read_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log::info!("frame stream ended: {err:#}");
                    break LoopExit::StreamEnded;
                }
            };

            let output = self.render(frame)?;
            sink.present(&output)?;
            frames_shown += 1;

            if sink.quit_requested() {
                break LoopExit::QuitRequested;
            }
        };

        Ok(RunSummary { exit, frames_shown })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use anyhow::anyhow;

    use super::*;
    use crate::{
        display::fixtures::{INDEX_COLOR, TONGUE_COLOR, overlays},
        gesture::fixtures::{JOINT_Y, UP_Y, fist, from_ys},
        mouth::fixtures::face_with_lips,
        types::{LandmarkSet, hand},
    };

    const CAMERA_PIXEL: [u8; 4] = [1, 2, 3, 255];

    fn camera_frame() -> Frame {
        Frame::new(CAMERA_PIXEL.repeat(8 * 6), 8, 6)
    }

    struct FakeCamera {
        frames_left: usize,
        released: Rc<Cell<bool>>,
    }

    impl FrameSource for FakeCamera {
        fn read_frame(&mut self) -> Result<Frame> {
            if self.frames_left == 0 {
                return Err(anyhow!("device disconnected"));
            }
            self.frames_left -= 1;
            Ok(camera_frame())
        }
    }

    impl Drop for FakeCamera {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    #[derive(Default)]
    struct FakeWindow {
        shown: Rc<RefCell<Vec<Frame>>>,
        quit_after: Option<usize>,
        released: Rc<Cell<bool>>,
    }

    impl FrameSink for FakeWindow {
        fn present(&mut self, frame: &Frame) -> Result<()> {
            self.shown.borrow_mut().push(frame.clone());
            Ok(())
        }

        fn quit_requested(&self) -> bool {
            self.quit_after
                .is_some_and(|limit| self.shown.borrow().len() >= limit)
        }
    }

    impl Drop for FakeWindow {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    struct FixedDetector {
        landmarks: Option<LandmarkSet>,
        calls: Rc<Cell<usize>>,
    }

    impl FixedDetector {
        fn boxed(landmarks: Option<LandmarkSet>) -> (Box<dyn LandmarkDetector>, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            let detector = Self {
                landmarks,
                calls: calls.clone(),
            };
            (Box::new(detector), calls)
        }
    }

    impl LandmarkDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.landmarks.clone())
        }
    }

    struct BrokenDetector;

    impl LandmarkDetector for BrokenDetector {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn detect(&mut self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
            Err(anyhow!("inference failed"))
        }
    }

    fn index_hand() -> LandmarkSet {
        let mut ys = fist();
        ys[hand::INDEX_TIP] = UP_Y;
        ys[hand::INDEX_PIP] = JOINT_Y;
        from_ys(&ys)
    }

    fn is_solid(frame: &Frame, color: [u8; 4]) -> bool {
        frame.rgba.chunks_exact(4).all(|px| {
            px.iter()
                .zip(color)
                .all(|(&got, want)| got.abs_diff(want) <= 1)
        })
    }

    #[test]
    fn index_hand_shows_index_overlay_at_frame_size() {
        let (hand, _) = FixedDetector::boxed(Some(index_hand()));
        let (face, _) = FixedDetector::boxed(Some(face_with_lips(0.5, 0.7)));
        let mut app = OverlayApp::new(hand, Some(face), overlays(true));

        let out = app.render(camera_frame()).unwrap();

        assert_eq!(out.dimensions(), (8, 6));
        assert!(is_solid(&out, INDEX_COLOR));
    }

    #[test]
    fn open_mouth_without_hand_shows_tongue() {
        let (hand, _) = FixedDetector::boxed(None);
        let (face, _) = FixedDetector::boxed(Some(face_with_lips(0.5, 0.6)));
        let mut app = OverlayApp::new(hand, Some(face), overlays(true));

        let out = app.render(camera_frame()).unwrap();
        assert!(is_solid(&out, TONGUE_COLOR));
    }

    #[test]
    fn missing_tongue_overlay_keeps_camera_and_skips_face() {
        let (hand, _) = FixedDetector::boxed(None);
        let (face, face_calls) = FixedDetector::boxed(Some(face_with_lips(0.5, 0.6)));
        let mut app = OverlayApp::new(hand, Some(face), overlays(false));

        let out = app.render(camera_frame()).unwrap();

        assert_eq!(out.rgba, camera_frame().rgba);
        assert_eq!(face_calls.get(), 0);
    }

    #[test]
    fn failing_detector_counts_as_nothing_found() {
        let (face, _) = FixedDetector::boxed(None);
        let mut app = OverlayApp::new(Box::new(BrokenDetector), Some(face), overlays(true));

        let signals = app.signals(&camera_frame());
        assert_eq!(signals, FrameSignals::default());
    }

    #[test]
    fn stream_failure_on_frame_n_shows_n_minus_one() {
        let (hand, hand_calls) = FixedDetector::boxed(None);
        let mut app = OverlayApp::new(hand, None, overlays(true));

        let camera_released = Rc::new(Cell::new(false));
        let window = FakeWindow::default();
        let shown = window.shown.clone();
        let window_released = window.released.clone();

        let summary = app
            .run(
                FakeCamera {
                    frames_left: 4,
                    released: camera_released.clone(),
                },
                window,
            )
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                exit: LoopExit::StreamEnded,
                frames_shown: 4
            }
        );
        assert_eq!(shown.borrow().len(), 4);
        assert_eq!(hand_calls.get(), 4);
        assert!(camera_released.get());
        assert!(window_released.get());
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let (hand, _) = FixedDetector::boxed(Some(index_hand()));
        let mut app = OverlayApp::new(hand, None, overlays(true));

        let camera_released = Rc::new(Cell::new(false));
        let mut window = FakeWindow::default();
        window.quit_after = Some(2);
        let shown = window.shown.clone();
        let window_released = window.released.clone();

        let summary = app
            .run(
                FakeCamera {
                    frames_left: 100,
                    released: camera_released.clone(),
                },
                window,
            )
            .unwrap();

        assert_eq!(summary.exit, LoopExit::QuitRequested);
        assert_eq!(summary.frames_shown, 2);
        assert!(shown.borrow().iter().all(|frame| is_solid(frame, INDEX_COLOR)));
        assert!(camera_released.get());
        assert!(window_released.get());
    }

    #[test]
    fn immediate_stream_end_shows_nothing() {
        let (hand, hand_calls) = FixedDetector::boxed(None);
        let mut app = OverlayApp::new(hand, None, overlays(true));
        let window = FakeWindow::default();
        let shown = window.shown.clone();

        let summary = app
            .run(
                FakeCamera {
                    frames_left: 0,
                    released: Rc::new(Cell::new(false)),
                },
                window,
            )
            .unwrap();

        assert_eq!(summary.frames_shown, 0);
        assert!(shown.borrow().is_empty());
        assert_eq!(hand_calls.get(), 0);
    }
}
