// Hand landmarks and the "where is the hand?" capability.
// The detector itself is external; anything that turns an image into zero or
// one 21-point hand can plug in through `LandmarkProvider`.

use crate::error::Error;
use crate::types::{FrameBuffer, Point};

/// Landmark indices of the 21-point hand model.
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const COUNT: usize = 21;
}

/// How far outside the image a landmark may sit, in image sizes.
/// Detectors extrapolate off-frame fingers; anything beyond this is clamped.
const OFF_FRAME_LIMIT: f32 = 1.0;

fn to_pixel(v: f32, extent: usize) -> i32 {
    let v = if v.is_nan() { 0.0 } else { v.clamp(-OFF_FRAME_LIMIT, 1.0 + OFF_FRAME_LIMIT) };
    (v * extent as f32) as i32
}

/// Bones of the hand skeleton as landmark index pairs (palm, then each finger).
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (0, 5), (9, 13), (13, 17), (5, 9), (0, 17),
    (1, 2), (2, 3), (3, 4),
    (5, 6), (6, 7), (7, 8),
    (9, 10), (10, 11), (11, 12),
    (13, 14), (14, 15), (15, 16),
    (17, 18), (18, 19), (19, 20),
];

/// One keypoint, normalized to the image: (0,0) top-left, (1,1) bottom-right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    pub landmarks: [Landmark; landmarks::COUNT],
}

impl Hand {
    /// Landmark `i` in frame pixels (truncated toward zero).
    /// Coordinates are clamped to one frame size beyond each edge; NaN maps to 0.
    pub fn pixel(&self, i: usize, width: usize, height: usize) -> Point {
        let lm = self.landmarks[i];
        Point::new(to_pixel(lm.x, width), to_pixel(lm.y, height))
    }

    pub fn index_tip(&self, width: usize, height: usize) -> Point {
        self.pixel(landmarks::INDEX_FINGER_TIP, width, height)
    }

    pub fn middle_tip(&self, width: usize, height: usize) -> Point {
        self.pixel(landmarks::MIDDLE_FINGER_TIP, width, height)
    }

    /// All landmarks in frame pixels, in model order.
    pub fn pixels(&self, width: usize, height: usize) -> Vec<Point> {
        (0..landmarks::COUNT).map(|i| self.pixel(i, width, height)).collect()
    }
}

/// Given one image, return zero or one hand.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<Hand>, Error>;

    /// Short name for the HUD / logs.
    fn name(&self) -> &'static str;
}

/// Mouse-driven stand-in for a real detector.
/// The cursor is the index tip; holding the left button pinches the middle tip onto it.
pub struct PointerHand {
    cursor: Option<(f32, f32)>,
    pinched: bool,
}

impl PointerHand {
    // Far enough from the index tip that an open "hand" never counts as a pinch.
    const OPEN_OFFSET_PX: f32 = 120.0;

    pub fn new() -> Self {
        Self { cursor: None, pinched: false }
    }

    /// Update from the window's pointer state; `None` = cursor outside the window.
    pub fn feed(&mut self, cursor: Option<(usize, usize)>, pinched: bool) {
        self.cursor = cursor.map(|(x, y)| (x as f32, y as f32));
        self.pinched = pinched;
    }
}

impl LandmarkProvider for PointerHand {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<Hand>, Error> {
        let Some((cx, cy)) = self.cursor else { return Ok(None) };
        if frame.width == 0 || frame.height == 0 {
            return Ok(None);
        }
        let (w, h) = (frame.width as f32, frame.height as f32);

        // A crude upright hand: wrist below the cursor, fingers fanned upwards.
        let mut lms = [Landmark::default(); landmarks::COUNT];
        let wrist = (cx, cy + 150.0);
        let finger_x = [-50.0, -20.0, 0.0, 20.0, 40.0];
        for (f, dx) in finger_x.iter().enumerate() {
            let base = 1 + f * 4;
            for joint in 0..4 {
                let t = (joint + 1) as f32 / 4.0;
                lms[base + joint] = Landmark {
                    x: (wrist.0 + dx * t) / w,
                    y: (wrist.1 - 150.0 * t) / h,
                };
            }
        }
        lms[landmarks::WRIST] = Landmark { x: wrist.0 / w, y: wrist.1 / h };

        // Index tip sits exactly on the cursor.
        lms[landmarks::INDEX_FINGER_TIP] = Landmark { x: cx / w, y: cy / h };
        let middle = if self.pinched {
            (cx, cy)
        } else {
            (cx + Self::OPEN_OFFSET_PX, cy)
        };
        lms[landmarks::MIDDLE_FINGER_TIP] = Landmark { x: middle.0 / w, y: middle.1 / h };

        Ok(Some(Hand { landmarks: lms }))
    }

    fn name(&self) -> &'static str {
        "mouse"
    }
}
