//! Per-frame geometric predicates over a hand landmark frame.

use crate::landmarks::{Finger, LandmarkFrame};

/// Thumb tip offset from its MCP (on either axis) that counts as extended
pub const THUMB_EXTENSION: f64 = 0.08;
/// Maximum tip-to-MCP distance for a folded finger
pub const FOLD_DISTANCE: f64 = 0.10;
/// Extra margin above the MCP required for a palm finger
pub const PALM_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureClassification {
    pub index_up: bool,
    pub middle_up: bool,
    pub ring_up: bool,
    pub pinky_up: bool,
    pub thumb_up: bool,
    pub is_fist: bool,
    pub is_palm: bool,
}

impl GestureClassification {
    pub fn index_only(&self) -> bool {
        self.index_up && !self.middle_up && !self.ring_up && !self.pinky_up
    }

    pub fn two_fingers(&self) -> bool {
        self.index_up && self.middle_up && !self.ring_up && !self.pinky_up
    }

    pub fn four_fingers(&self) -> bool {
        self.index_up && self.middle_up && self.ring_up && self.pinky_up && !self.thumb_up
    }

    pub fn open_palm(&self) -> bool {
        self.is_palm && self.thumb_up
    }
}

pub fn classify(frame: &LandmarkFrame) -> GestureClassification {
    GestureClassification {
        index_up: finger_up(frame, Finger::Index),
        middle_up: finger_up(frame, Finger::Middle),
        ring_up: finger_up(frame, Finger::Ring),
        pinky_up: finger_up(frame, Finger::Pinky),
        thumb_up: thumb_extended(frame),
        is_fist: is_fist(frame),
        is_palm: is_palm(frame),
    }
}

pub fn finger_up(frame: &LandmarkFrame, finger: Finger) -> bool {
    frame.tip(finger).y < frame.mcp(finger).y
}

pub fn thumb_extended(frame: &LandmarkFrame) -> bool {
    let tip = frame.thumb_tip();
    let mcp = frame.thumb_mcp();
    (tip.x - mcp.x).abs() > THUMB_EXTENSION || (tip.y - mcp.y).abs() > THUMB_EXTENSION
}

pub fn is_fist(frame: &LandmarkFrame) -> bool {
    Finger::ALL
        .iter()
        .all(|&finger| frame.tip(finger).distance_2d(frame.mcp(finger)) < FOLD_DISTANCE)
}

pub fn is_palm(frame: &LandmarkFrame) -> bool {
    thumb_extended(frame)
        && Finger::ALL
            .iter()
            .all(|&finger| frame.tip(finger).y < frame.mcp(finger).y - PALM_MARGIN)
}

/// Index fingertip mirrored horizontally so it moves with the user
pub fn mirrored_index_x(frame: &LandmarkFrame) -> f64 {
    1.0 - frame.index_tip().x
}

/// Reference height for vertical scrolling: the index tip alone, or the
/// average of index and middle tips when both are raised.
pub fn scroll_reference_y(frame: &LandmarkFrame, two_fingers: bool) -> f64 {
    if two_fingers {
        (frame.index_tip().y + frame.middle_tip().y) / 2.0
    } else {
        frame.index_tip().y
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::landmarks::*;

    #[test]
    fn test_fist_classification() {
        let c = classify(&fist());
        assert!(c.is_fist);
        assert!(!c.is_palm);
        assert!(!c.index_up && !c.middle_up && !c.ring_up && !c.pinky_up);
        assert!(!c.thumb_up);
    }

    #[test]
    fn test_index_only() {
        let c = classify(&index_only_at(0.4, 0.3));
        assert!(c.index_only());
        assert!(!c.two_fingers());
        assert!(!c.is_fist);
    }

    #[test]
    fn test_two_fingers() {
        let c = classify(&two_fingers_at(0.4));
        assert!(c.two_fingers());
        assert!(!c.index_only());
    }

    #[test]
    fn test_four_fingers_without_thumb() {
        let c = classify(&four_fingers_at(0.45));
        assert!(c.four_fingers());
        assert!(!c.open_palm());
    }

    #[test]
    fn test_palm_requires_thumb_and_margin() {
        let c = classify(&palm());
        assert!(c.open_palm());
        assert!(!c.four_fingers());

        // Fingers barely above their knuckles are "up" but not a palm
        let mut points = palm().points().to_owned();
        points[RING_TIP].y = points[RING_MCP].y - 0.01;
        let c = classify(&LandmarkFrame::from_array(points));
        assert!(c.ring_up);
        assert!(!c.is_palm);
    }

    #[test]
    fn test_thumb_vertical_extension() {
        let mut points = base_hand();
        points[THUMB_TIP] = Landmark::new(points[THUMB_MCP].x, points[THUMB_MCP].y - 0.09, 0.0);
        assert!(thumb_extended(&LandmarkFrame::from_array(points)));
    }

    #[test]
    fn test_scroll_reference() {
        let frame = two_fingers_at(0.4);
        assert!((scroll_reference_y(&frame, true) - 0.4).abs() < 1e-12);

        let frame = index_only_at(0.3, 0.25);
        assert!((scroll_reference_y(&frame, false) - 0.25).abs() < 1e-12);
        assert!((mirrored_index_x(&frame) - 0.7).abs() < 1e-12);
    }
}
