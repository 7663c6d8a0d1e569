// Composes one calculator frame on top of the camera image:
// hand skeleton, display panel with the expression, the keypad, and a HUD line.

use crate::calculator::App;
use crate::draw::{
    GLYPH_H, blend_rect, draw_line, draw_text, draw_text_shadowed, fill_circle, fill_rect, rgb,
    stroke_rect, text_width,
};
use crate::hand::{HAND_CONNECTIONS, Hand};
use crate::keypad::{Button, Rect};
use crate::types::FrameBuffer;

const BUTTON_IDLE: u32 = rgb(200, 200, 200);
const BUTTON_ACTIVE: u32 = rgb(0, 255, 0);
const BUTTON_BORDER: u32 = rgb(50, 50, 50);
const BUTTON_ALPHA: f32 = 0.5;
const TEXT: u32 = rgb(0, 0, 0);
const DISPLAY_BG: u32 = rgb(255, 255, 255);
const BONE: u32 = rgb(255, 255, 255);
const JOINT: u32 = rgb(255, 0, 0);
const HUD: u32 = rgb(255, 255, 255);

const LABEL_SCALE: i32 = 3;
const DISPLAY_SCALE: i32 = 3;
const DISPLAY_PAD: i32 = 10;

/// Draw the hand skeleton: bones as lines, landmarks as dots.
pub fn draw_hand(fb: &mut FrameBuffer, hand: &Hand) {
    let pts = hand.pixels(fb.width, fb.height);
    for (a, b) in HAND_CONNECTIONS {
        draw_line(fb, pts[a].x, pts[a].y, pts[b].x, pts[b].y, 2, BONE);
    }
    for p in &pts {
        fill_circle(fb, p.x, p.y, 4, JOINT);
    }
}

/// Longest tail of `text` that fits into `max_w` pixels at `scale`.
fn fitting_tail(text: &str, max_w: i32, scale: i32) -> &str {
    text.char_indices()
        .map(|(i, _)| &text[i..])
        .find(|tail| text_width(tail, scale) <= max_w)
        .unwrap_or("")
}

pub fn draw_display(fb: &mut FrameBuffer, panel: Rect, text: &str) {
    fill_rect(fb, panel.x, panel.y, panel.width, panel.height, DISPLAY_BG);

    // Keep the most recent input visible when the expression outgrows the panel.
    let shown = fitting_tail(text, panel.width - 2 * DISPLAY_PAD, DISPLAY_SCALE);
    let y = panel.y + (panel.height - GLYPH_H * DISPLAY_SCALE) / 2;
    draw_text(fb, panel.x + DISPLAY_PAD, y, shown, DISPLAY_SCALE, TEXT);
}

pub fn draw_button(fb: &mut FrameBuffer, b: &Button) {
    let (x, y) = (b.pos.x, b.pos.y);
    let fill = if b.active { BUTTON_ACTIVE } else { BUTTON_IDLE };
    blend_rect(fb, x, y, b.width, b.height, fill, BUTTON_ALPHA);
    stroke_rect(fb, x, y, b.width, b.height, 2, BUTTON_BORDER);

    let mut buf = [0u8; 4];
    let label: &str = b.key.label().encode_utf8(&mut buf);
    let lx = x + (b.width - text_width(label, LABEL_SCALE)) / 2;
    let ly = y + (b.height - GLYPH_H * LABEL_SCALE) / 2;
    draw_text(fb, lx, ly, label, LABEL_SCALE, TEXT);
}

/// Everything on top of the camera frame already in `fb`.
pub fn compose(fb: &mut FrameBuffer, app: &App, hand: Option<&Hand>, hud: &str) {
    if let Some(hand) = hand {
        draw_hand(fb, hand);
    }

    draw_display(fb, app.keypad().display(), app.expression());
    for b in app.keypad().buttons() {
        draw_button(fb, b);
    }

    draw_text_shadowed(fb, 8, 8, hud, 2, HUD);
}
