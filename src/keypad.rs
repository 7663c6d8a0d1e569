// The on-screen 4x4 keypad: layout, hit-testing and highlight flags.
// Buttons are laid out once at startup; afterwards only `active` changes.

use crate::types::Point;

/// Labels in grid order (row-major).
pub const LABELS: [[char; 4]; 4] = [
    ['7', '8', '9', '/'],
    ['4', '5', '6', '*'],
    ['1', '2', '3', '-'],
    ['C', '0', '=', '+'],
];

/// What a button does when clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Digit or operator appended to the expression.
    Append(char),
    Clear,
    Evaluate,
}

impl Key {
    pub fn from_label(label: char) -> Self {
        match label {
            'C' => Key::Clear,
            '=' => Key::Evaluate,
            other => Key::Append(other),
        }
    }

    pub fn label(self) -> char {
        match self {
            Key::Append(ch) => ch,
            Key::Clear => 'C',
            Key::Evaluate => '=',
        }
    }
}

#[derive(Clone, Debug)]
pub struct Button {
    pub pos: Point, // top-left corner
    pub width: i32,
    pub height: i32,
    pub key: Key,
    pub active: bool, // highlighted this frame
}

impl Button {
    pub fn new(pos: Point, width: i32, height: i32, key: Key) -> Self {
        Self { pos, width, height, key, active: false }
    }

    /// True when `p` lies strictly inside the rectangle; edges don't count.
    pub fn contains(&self, p: Point) -> bool {
        self.pos.x < p.x
            && p.x < self.pos.x + self.width
            && self.pos.y < p.y
            && p.y < self.pos.y + self.height
    }
}

/// Button/display geometry in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub button_w: i32,
    pub button_h: i32,
    pub gap: i32,
    pub display_h: i32,
}

impl Default for Layout {
    fn default() -> Self {
        Self { button_w: 55, button_h: 55, gap: 10, display_h: 60 }
    }
}

impl Layout {
    pub fn keypad_width(&self) -> i32 {
        4 * self.button_w + 3 * self.gap
    }

    pub fn keypad_height(&self) -> i32 {
        4 * self.button_h + 3 * self.gap
    }
}

/// Axis-aligned rectangle, used for the expression display panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

pub struct Keypad {
    buttons: Vec<Button>,
    display: Rect,
}

impl Keypad {
    /// Center the keypad (plus the display panel above it) in a frame of the given size.
    pub fn new(layout: Layout, frame_w: i32, frame_h: i32) -> Self {
        // The display sits `display_h` tall, 10 px above the first button row.
        let calc_w = layout.keypad_width();
        let calc_h = layout.keypad_height();
        let start_x = (frame_w - calc_w).div_euclid(2);
        let block_h = calc_h + layout.display_h + 10;
        let start_y = (frame_h - block_h).div_euclid(2) + layout.display_h + 10;

        let mut buttons = Vec::with_capacity(16);
        for (i, row) in LABELS.iter().enumerate() {
            for (j, &label) in row.iter().enumerate() {
                let x = start_x + j as i32 * (layout.button_w + layout.gap);
                let y = start_y + i as i32 * (layout.button_h + layout.gap);
                buttons.push(Button::new(
                    Point::new(x, y),
                    layout.button_w,
                    layout.button_h,
                    Key::from_label(label),
                ));
            }
        }

        let display = Rect {
            x: start_x,
            y: start_y - layout.display_h - 10,
            width: calc_w,
            height: layout.display_h,
        };

        Self { buttons, display }
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn display(&self) -> Rect {
        self.display
    }

    /// Index of the first button (grid order) containing `p`.
    pub fn hit_test(&self, p: Point) -> Option<usize> {
        self.buttons.iter().position(|b| b.contains(p))
    }

    /// Hit-test a click; the button found is highlighted and its key returned.
    pub fn press(&mut self, p: Point) -> Option<Key> {
        let idx = self.hit_test(p)?;
        let button = &mut self.buttons[idx];
        button.active = true;
        Some(button.key)
    }

    pub fn clear_active(&mut self) {
        for b in &mut self.buttons {
            b.active = false;
        }
    }
}
