// Pinch-to-click: turns two fingertip positions per frame into click events.
// A pinch is index tip + middle tip closer than the threshold; accepted clicks
// are debounced by a cooldown so one pinch doesn't type the same key twice.

use std::time::{Duration, Instant};

use crate::types::Point;

/// What a sustained pinch does once its click has been accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickPolicy {
    /// One click per pinch; fingers must separate before the next click.
    ReleaseToRearm,
    /// A held pinch clicks again every time the cooldown runs out.
    AutoRepeat,
}

/// Result of interpreting one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEvent {
    /// A click was accepted at this point (the index fingertip).
    Click(Point),
    /// The pinch that produced the last click is still held.
    Held,
    /// No hand, no pinch, or a pinch rejected by the cooldown.
    Idle,
}

pub struct GestureInterpreter {
    threshold: f32,
    cooldown: Duration,
    policy: ClickPolicy,
    last_click: Option<Instant>,
    // Set once a pinch has clicked; cleared when the fingers separate.
    latched: bool,
}

impl GestureInterpreter {
    pub fn new(threshold: f32, cooldown: Duration, policy: ClickPolicy) -> Self {
        Self { threshold, cooldown, policy, last_click: None, latched: false }
    }

    pub fn is_pinch(&self, index_tip: Point, middle_tip: Point) -> bool {
        index_tip.distance(middle_tip) < self.threshold
    }

    /// Feed one frame. `tips` is `(index_tip, middle_tip)` or `None` when no hand was seen.
    pub fn update(&mut self, tips: Option<(Point, Point)>, now: Instant) -> GestureEvent {
        let Some((index_tip, middle_tip)) = tips else {
            self.latched = false;
            return GestureEvent::Idle;
        };

        if !self.is_pinch(index_tip, middle_tip) {
            self.latched = false;
            return GestureEvent::Idle;
        }

        if self.latched && self.policy == ClickPolicy::ReleaseToRearm {
            return GestureEvent::Held;
        }

        let cooled = match self.last_click {
            None => true,
            Some(t) => now.saturating_duration_since(t) > self.cooldown,
        };
        if !cooled {
            return GestureEvent::Idle;
        }

        self.last_click = Some(now);
        self.latched = true;
        GestureEvent::Click(index_tip)
    }
}
