// Window + software drawing utilities.
// Provided here:
// 1) A window that shows the composed calculator image.
// 2) Pixel, line, rectangle and disc primitives on a FrameBuffer.
// 3) A tiny 5x7 bitmap font, scalable by whole pixels, for labels and the display.

use crate::error::Error;
use crate::types::FrameBuffer;
use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window, // the on-screen window you see; closed when dropped
}

impl Drawer {
    /// Create a window sized to the camera feed.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen (also pumps window events).
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Q or ESC ends the program.
    pub fn quit_pressed(&self) -> bool {
        self.window.is_key_down(Key::Q) || self.window.is_key_down(Key::Escape)
    }

    /// Mouse position in window pixels; `None` while the cursor is outside the window.
    pub fn mouse_pos(&self) -> Option<(usize, usize)> {
        self.window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| (x.max(0.0) as usize, y.max(0.0) as usize))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }
}

/* ---------- Colors ---------- */

#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Mix `over` onto `under`; `alpha` = weight of `over` in [0,1].
#[inline]
pub fn mix(under: u32, over: u32, alpha: f32) -> u32 {
    let a = alpha.clamp(0.0, 1.0);
    let ch = |shift: u32| {
        let u = ((under >> shift) & 0xFF) as f32;
        let o = ((over >> shift) & 0xFF) as f32;
        ((o * a + u * (1.0 - a)).round() as u32).min(255) << shift
    };
    ch(16) | ch(8) | ch(0)
}

/* ---------- Software drawing ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
pub fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Fill the axis-aligned rectangle [x, x+w) x [y, y+h), clipped to the frame.
pub fn fill_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32) {
    let x0 = x.max(0) as usize;
    let y0 = y.max(0) as usize;
    let x1 = (x + w).clamp(0, fb.width as i32) as usize;
    let y1 = (y + h).clamp(0, fb.height as i32) as usize;
    for row in y0..y1 {
        let ofs = row * fb.width;
        for px in &mut fb.pixels[ofs + x0.min(x1)..ofs + x1] {
            *px = color;
        }
    }
}

/// Like `fill_rect` but translucent: every covered pixel is mixed with `color`.
pub fn blend_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32, alpha: f32) {
    let x0 = x.max(0) as usize;
    let y0 = y.max(0) as usize;
    let x1 = (x + w).clamp(0, fb.width as i32) as usize;
    let y1 = (y + h).clamp(0, fb.height as i32) as usize;
    for row in y0..y1 {
        let ofs = row * fb.width;
        for px in &mut fb.pixels[ofs + x0.min(x1)..ofs + x1] {
            *px = mix(*px, color, alpha);
        }
    }
}

/// Rectangle outline `thickness` pixels wide, drawn inside the bounds.
pub fn stroke_rect(
    fb: &mut FrameBuffer,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    thickness: i32,
    color: u32,
) {
    let t = thickness.min(w / 2).min(h / 2).max(1);
    fill_rect(fb, x, y, w, t, color);         // top
    fill_rect(fb, x, y + h - t, w, t, color); // bottom
    fill_rect(fb, x, y, t, h, color);         // left
    fill_rect(fb, x + w - t, y, t, h, color); // right
}

/// Solid disc centered at (cx,cy).
pub fn fill_circle(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: u32) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                put_pixel(fb, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line; `thickness` > 1 stamps a small square at every step.
pub fn draw_line(
    fb: &mut FrameBuffer,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: i32,
    color: u32,
) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let half = (thickness.max(1) - 1) / 2;
    loop {
        if half == 0 {
            put_pixel(fb, x0, y0, color);
        } else {
            fill_rect(fb, x0 - half, y0 - half, 2 * half + 1, 2 * half + 1, color);
        }
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/* ---------- 5x7 bitmap font ---------- */

pub const GLYPH_W: i32 = 5;
pub const GLYPH_H: i32 = 7;
const ADVANCE: i32 = GLYPH_W + 1; // 1 pixel spacing between glyphs

/// Return a 5x7 glyph bitmap. Lowercase letters use the uppercase shapes.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        // Calculator symbols
        '+' => g!(0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '*' => g!(0b00000,0b00100,0b10101,0b01110,0b10101,0b00100,0b00000),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '=' => g!(0b00000,0b00000,0b11111,0b00000,0b11111,0b00000,0b00000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),

        // Punctuation: space, vertical bar, colon, dot
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),

        _ => None,
    }
}

/// Width in pixels of `text` drawn at `scale` (no trailing spacing).
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { (n * ADVANCE - 1) * scale }
}

/// Draw a single glyph with every font pixel expanded to a `scale` x `scale` block.
fn draw_char(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, scale: i32, color: u32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (ry, rowbits) in rows.iter().enumerate() {
        for rx in 0..GLYPH_W {
            if (rowbits & (1 << (4 - rx))) != 0 {
                fill_rect(fb, x + rx * scale, y + ry as i32 * scale, scale, scale, color);
            }
        }
    }
}

/// Draw `text` with its top-left corner at (x,y). Unknown characters leave a gap.
pub fn draw_text(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, scale: i32, color: u32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char(fb, x, y, ch, scale, color);
        x += ADVANCE * scale;
    }
}

/// HUD text: black 1-pixel shadow under the glyphs for contrast on video.
pub fn draw_text_shadowed(
    fb: &mut FrameBuffer,
    x: i32,
    y: i32,
    text: &str,
    scale: i32,
    color: u32,
) {
    draw_text(fb, x + scale.max(1), y + scale.max(1), text, scale, 0x00_00_00_00);
    draw_text(fb, x, y, text, scale, color);
}
