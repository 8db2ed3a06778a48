use crate::types::{LandmarkSet, face};

/// Lip gap, in normalized frame height, above which the mouth counts as open.
pub const MOUTH_OPEN_THRESHOLD: f32 = 0.04;

pub fn is_mouth_open(landmarks: &LandmarkSet) -> bool {
    lip_gap(landmarks).is_some_and(|gap| gap > MOUTH_OPEN_THRESHOLD)
}

pub fn lip_gap(landmarks: &LandmarkSet) -> Option<f32> {
    let upper = landmarks.get(face::UPPER_LIP_CENTER)?;
    let lower = landmarks.get(face::LOWER_LIP_CENTER)?;
    Some((lower.y - upper.y).abs())
}


#[cfg(test)]
mod tests {
    use super::fixtures::face_with_lips;
    use super::*;
    use crate::types::Landmark;

    #[test]
    fn wide_gap_is_open() {
        assert!(is_mouth_open(&face_with_lips(0.60, 0.70)));
    }

    #[test]
    fn narrow_gap_is_closed() {
        assert!(!is_mouth_open(&face_with_lips(0.60, 0.62)));
    }

    #[test]
    fn gap_exactly_at_threshold_is_closed() {
        let landmarks = face_with_lips(0.0, MOUTH_OPEN_THRESHOLD);
        assert_eq!(lip_gap(&landmarks), Some(MOUTH_OPEN_THRESHOLD));
        assert!(!is_mouth_open(&landmarks));
    }

    #[test]
    fn swapped_lips_use_absolute_gap() {
        assert!(is_mouth_open(&face_with_lips(0.70, 0.60)));
    }

    #[test]
    fn missing_lip_points_are_closed() {
        let short = LandmarkSet::new(vec![Landmark::new(0.5, 0.1); 10]);
        assert_eq!(lip_gap(&short), None);
        assert!(!is_mouth_open(&short));
    }
}
