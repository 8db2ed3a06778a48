use crate::types::{GestureKind, Landmark, LandmarkSet, hand};

/// Per-digit readout taken from one hand. Image y grows downwards, so a tip
/// above its joint has the smaller y.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitReadout {
    pub thumb_open: bool,
    pub index_open: bool,
    pub middle_open: bool,
    pub ring_closed: bool,
    pub pinky_closed: bool,
}

impl DigitReadout {
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Option<Self> {
        if landmarks.len() < hand::COUNT {
            return None;
        }

        let point = |idx: usize| landmarks.get(idx);

        Some(Self {
            thumb_open: is_open(point(hand::THUMB_TIP)?, point(hand::THUMB_IP)?),
            index_open: is_open(point(hand::INDEX_TIP)?, point(hand::INDEX_PIP)?),
            middle_open: is_open(point(hand::MIDDLE_TIP)?, point(hand::MIDDLE_PIP)?),
            ring_closed: is_closed(point(hand::RING_TIP)?, point(hand::RING_PIP)?),
            pinky_closed: is_closed(point(hand::PINKY_TIP)?, point(hand::PINKY_PIP)?),
        })
    }

    fn only_index(&self) -> bool {
        self.index_open && !self.middle_open && self.lower_fingers_closed() && !self.thumb_open
    }

    fn only_middle(&self) -> bool {
        self.middle_open && !self.index_open && self.lower_fingers_closed() && !self.thumb_open
    }

    fn only_thumb(&self) -> bool {
        self.thumb_open && !self.index_open && !self.middle_open && self.lower_fingers_closed()
    }

    fn lower_fingers_closed(&self) -> bool {
        self.ring_closed && self.pinky_closed
    }
}

// Checked in order; the first matching shape wins.
const SHAPES: [(fn(&DigitReadout) -> bool, GestureKind); 3] = [
    (DigitReadout::only_index, GestureKind::IndexOnly),
    (DigitReadout::only_middle, GestureKind::MiddleOnly),
    (DigitReadout::only_thumb, GestureKind::ThumbOnly),
];

pub fn classify(landmarks: &LandmarkSet) -> GestureKind {
    let Some(readout) = DigitReadout::from_landmarks(landmarks) else {
        return GestureKind::None;
    };

    SHAPES
        .iter()
        .find(|(matches, _)| matches(&readout))
        .map(|(_, gesture)| *gesture)
        .unwrap_or(GestureKind::None)
}

fn is_open(tip: Landmark, joint: Landmark) -> bool {
    tip.y < joint.y
}

fn is_closed(tip: Landmark, joint: Landmark) -> bool {
    tip.y > joint.y
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::{Landmark, LandmarkSet, hand};

    pub const JOINT_Y: f32 = 0.5;
    pub const UP_Y: f32 = 0.3;
    pub const DOWN_Y: f32 = 0.7;

    /// A fist: every tip sits below its joint.
    pub fn fist() -> [f32; hand::COUNT] {
        let mut ys = [JOINT_Y; hand::COUNT];
        for tip in [
            hand::THUMB_TIP,
            hand::INDEX_TIP,
            hand::MIDDLE_TIP,
            hand::RING_TIP,
            hand::PINKY_TIP,
        ] {
            ys[tip] = DOWN_Y;
        }
        ys
    }

    pub fn hand_with_raised(tips: &[usize]) -> LandmarkSet {
        let mut ys = fist();
        for &tip in tips {
            ys[tip] = UP_Y;
        }
        from_ys(&ys)
    }

    pub fn from_ys(ys: &[f32]) -> LandmarkSet {
        LandmarkSet::new(
            ys.iter()
                .enumerate()
                .map(|(i, &y)| Landmark::new(0.3 + i as f32 * 0.02, y))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn single_raised_digit_maps_to_its_gesture() {
        assert_eq!(
            classify(&hand_with_raised(&[hand::INDEX_TIP])),
            GestureKind::IndexOnly
        );
        assert_eq!(
            classify(&hand_with_raised(&[hand::MIDDLE_TIP])),
            GestureKind::MiddleOnly
        );
        assert_eq!(
            classify(&hand_with_raised(&[hand::THUMB_TIP])),
            GestureKind::ThumbOnly
        );
    }

    #[test]
    fn fist_and_open_palm_are_not_gestures() {
        assert_eq!(classify(&from_ys(&fist())), GestureKind::None);

        let palm = hand_with_raised(&[
            hand::THUMB_TIP,
            hand::INDEX_TIP,
            hand::MIDDLE_TIP,
            hand::RING_TIP,
            hand::PINKY_TIP,
        ]);
        assert_eq!(classify(&palm), GestureKind::None);
    }

    #[test]
    fn two_raised_digits_match_nothing() {
        let peace = hand_with_raised(&[hand::INDEX_TIP, hand::MIDDLE_TIP]);
        assert_eq!(classify(&peace), GestureKind::None);

        let gun = hand_with_raised(&[hand::INDEX_TIP, hand::THUMB_TIP]);
        assert_eq!(classify(&gun), GestureKind::None);
    }

    #[test]
    fn raised_ring_or_pinky_blocks_every_shape() {
        let with_pinky = hand_with_raised(&[hand::INDEX_TIP, hand::PINKY_TIP]);
        assert_eq!(classify(&with_pinky), GestureKind::None);

        let with_ring = hand_with_raised(&[hand::THUMB_TIP, hand::RING_TIP]);
        assert_eq!(classify(&with_ring), GestureKind::None);
    }

    #[test]
    fn ring_tip_level_with_joint_is_not_closed() {
        let mut ys = fist();
        ys[hand::INDEX_TIP] = UP_Y;
        ys[hand::RING_TIP] = ys[hand::RING_PIP];
        assert_eq!(classify(&from_ys(&ys)), GestureKind::None);
    }

    #[test]
    fn index_tip_level_with_joint_counts_as_closed() {
        let mut ys = fist();
        ys[hand::THUMB_TIP] = UP_Y;
        ys[hand::INDEX_TIP] = ys[hand::INDEX_PIP];
        assert_eq!(classify(&from_ys(&ys)), GestureKind::ThumbOnly);
    }

    #[test]
    fn raised_digit_past_the_top_edge_still_reads_open() {
        let mut ys = fist();
        ys[hand::INDEX_TIP] = -0.2;
        ys[hand::INDEX_PIP] = -0.05;
        assert_eq!(classify(&from_ys(&ys)), GestureKind::IndexOnly);
    }

    #[test]
    fn incomplete_hand_is_none() {
        let partial = from_ys(&[UP_Y; 12]);
        assert_eq!(classify(&partial), GestureKind::None);
        assert_eq!(DigitReadout::from_landmarks(&partial), None);
    }

    #[test]
    fn readout_reports_each_digit() {
        let readout =
            DigitReadout::from_landmarks(&hand_with_raised(&[hand::MIDDLE_TIP])).unwrap();
        assert_eq!(
            readout,
            DigitReadout {
                thumb_open: false,
                index_open: false,
                middle_open: true,
                ring_closed: true,
                pinky_closed: true,
            }
        );
    }
}
