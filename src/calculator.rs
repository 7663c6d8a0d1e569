// Application state: the expression being typed, the keypad and the pinch debounce.
// Owned by the main loop and advanced once per frame through `App::step`.

use std::time::Instant;

use crate::config::Config;
use crate::expr;
use crate::gesture::{GestureEvent, GestureInterpreter};
use crate::keypad::{Key, Keypad};
use crate::types::Point;

/// Shown in place of the expression when evaluation fails; only `C` gets rid of it.
pub const ERROR_TEXT: &str = "Error";

/// The text typed so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expression {
    text: String,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Apply one key press.
    pub fn apply(&mut self, key: Key) {
        match key {
            Key::Clear => self.text.clear(),
            Key::Evaluate => {
                self.text = match expr::evaluate(&self.text) {
                    Ok(value) => value.to_string(),
                    Err(e) => {
                        log::warn!("Cannot evaluate {:?}: {e}", self.text);
                        ERROR_TEXT.to_string()
                    }
                };
            }
            Key::Append(ch) => self.text.push(ch),
        }
    }
}

pub struct App {
    keypad: Keypad,
    expression: Expression,
    gesture: GestureInterpreter,
}

impl App {
    pub fn new(cfg: &Config) -> Self {
        Self {
            keypad: Keypad::new(cfg.layout, cfg.frame_width as i32, cfg.frame_height as i32),
            expression: Expression::new(),
            gesture: GestureInterpreter::new(
                cfg.pinch_threshold,
                cfg.click_cooldown,
                cfg.click_policy,
            ),
        }
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn expression(&self) -> &str {
        self.expression.as_str()
    }

    /// Advance one frame. `tips` = (index tip, middle tip) of the detected hand, if any.
    /// Returns the key activated this frame.
    pub fn step(&mut self, tips: Option<(Point, Point)>, now: Instant) -> Option<Key> {
        match self.gesture.update(tips, now) {
            GestureEvent::Click(at) => {
                // Highlight only the newly clicked button (if the click hit one).
                self.keypad.clear_active();
                let key = self.keypad.press(at)?;
                log::info!("Pressed {}", key.label());
                self.expression.apply(key);
                Some(key)
            }
            GestureEvent::Held => None, // keep the highlight of the held click
            GestureEvent::Idle => {
                self.keypad.clear_active();
                None
            }
        }
    }
}
