//! Hand landmark frames as produced by the detection model.
//!
//! Points are in normalized image space: `x` grows to the right of the
//! camera image, `y` grows downward, both in `[0, 1]`.

use serde::{Deserialize, Serialize};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_MCP: usize = 2;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// A single normalized landmark
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance, ignoring depth
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 3]> for Landmark {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// The four non-thumb fingers, each addressed by its (tip, MCP) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn tip(self) -> usize {
        match self {
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
            Finger::Pinky => PINKY_TIP,
        }
    }

    pub fn mcp(self) -> usize {
        match self {
            Finger::Index => INDEX_MCP,
            Finger::Middle => MIDDLE_MCP,
            Finger::Ring => RING_MCP,
            Finger::Pinky => PINKY_MCP,
        }
    }
}

/// Exactly 21 landmarks of one detected hand
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    /// Build a frame from detector output. Returns `None` unless at least 21
    /// points are present; extra points are ignored.
    pub fn from_points(points: &[Landmark]) -> Option<Self> {
        if points.len() < LANDMARK_COUNT {
            return None;
        }
        let mut frame = [Landmark::default(); LANDMARK_COUNT];
        frame.copy_from_slice(&points[..LANDMARK_COUNT]);
        Some(Self { points: frame })
    }

    pub fn from_array(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn point(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn wrist(&self) -> &Landmark {
        &self.points[WRIST]
    }

    pub fn thumb_tip(&self) -> &Landmark {
        &self.points[THUMB_TIP]
    }

    pub fn thumb_mcp(&self) -> &Landmark {
        &self.points[THUMB_MCP]
    }

    pub fn tip(&self, finger: Finger) -> &Landmark {
        &self.points[finger.tip()]
    }

    pub fn mcp(&self, finger: Finger) -> &Landmark {
        &self.points[finger.mcp()]
    }

    pub fn index_tip(&self) -> &Landmark {
        self.tip(Finger::Index)
    }

    pub fn middle_tip(&self) -> &Landmark {
        self.tip(Finger::Middle)
    }
}
