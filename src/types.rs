// Core types shared by the camera, the gesture logic and the renderer.

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

#[cfg(test)]
impl FrameBuffer {
    /// A black frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}

/// A pixel position in frame space (origin top-left, y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels. Defined for the whole `i32` range.
    pub fn distance(self, other: Point) -> f32 {
        let dx = (i64::from(self.x) - i64::from(other.x)) as f32;
        let dy = (i64::from(self.y) - i64::from(other.y)) as f32;
        dx.hypot(dy)
    }
}
