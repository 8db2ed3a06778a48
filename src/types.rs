use std::time::Instant;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    #[allow(dead_code)]
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A single detected point in frame-normalized coordinates (origin top-left).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Landmarks for one hand or one face, in the detector's anatomical order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Normalizes pixel-space points against the frame they were detected in.
    pub fn from_pixels(points: &[(f32, f32)], width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Self {
            points: points
                .iter()
                .map(|&(x, y)| Landmark::new(x / w, y / h))
                .collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// MediaPipe hand landmark numbering.
pub mod hand {
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    pub const COUNT: usize = 21;
}

/// MediaPipe face mesh numbering (only the points the mouth check reads).
pub mod face {
    pub const UPPER_LIP_CENTER: usize = 13;
    pub const LOWER_LIP_CENTER: usize = 14;

    pub const COUNT: usize = 468;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureKind {
    #[default]
    None,
    IndexOnly,
    MiddleOnly,
    ThumbOnly,
}

impl GestureKind {
    pub fn label(&self) -> &'static str {
        match self {
            GestureKind::None => "none",
            GestureKind::IndexOnly => "index finger",
            GestureKind::MiddleOnly => "middle finger",
            GestureKind::ThumbOnly => "thumb up",
        }
    }
}

/// Classifier outputs for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSignals {
    pub gesture: GestureKind,
    pub mouth_open: bool,
}
