// Every tunable of the calculator in one place.
// Defaults match the calibrated setup: 801x636 frame, 40 px pinch, 0.5 s cooldown.
// A handful of environment variables can override them; there are no flags or files.

use std::time::Duration;

use crate::gesture::ClickPolicy;
use crate::keypad::Layout;

pub const ENV_CAMERA: &str = "PINCH_CALC_CAMERA";
pub const ENV_DETECTOR: &str = "PINCH_CALC_DETECTOR";
pub const ENV_REPEAT: &str = "PINCH_CALC_REPEAT";

#[derive(Clone, Debug)]
pub struct Config {
    pub camera_index: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Fingertip distance (pixels) below which index + middle count as a pinch.
    pub pinch_threshold: f32,
    /// Minimum time between two accepted clicks.
    pub click_cooldown: Duration,
    pub click_policy: ClickPolicy,
    pub layout: Layout,
    /// Program + args of the external landmark detector. `None` = mouse fallback.
    pub detector_command: Option<Vec<String>>,
    pub detector_confidence: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            frame_width: 801,
            frame_height: 636,
            pinch_threshold: 40.0,
            click_cooldown: Duration::from_millis(500),
            click_policy: ClickPolicy::ReleaseToRearm,
            layout: Layout::default(),
            detector_command: None,
            detector_confidence: 0.5,
        }
    }
}

impl Config {
    /// Defaults overlaid with whatever the process environment sets.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_CAMERA) {
            match raw.trim().parse::<u32>() {
                Ok(idx) => cfg.camera_index = idx,
                Err(e) => log::warn!("Ignoring {ENV_CAMERA}={raw:?}: {e}"),
            }
        }

        if let Some(raw) = lookup(ENV_DETECTOR) {
            let parts: Vec<String> = raw.split_whitespace().map(str::to_owned).collect();
            if parts.is_empty() {
                log::warn!("Ignoring empty {ENV_DETECTOR}");
            } else {
                cfg.detector_command = Some(parts);
            }
        }

        if let Some(raw) = lookup(ENV_REPEAT) {
            match raw.trim() {
                "1" | "true" | "yes" => cfg.click_policy = ClickPolicy::AutoRepeat,
                "0" | "false" | "no" => cfg.click_policy = ClickPolicy::ReleaseToRearm,
                other => log::warn!("Ignoring {ENV_REPEAT}={other:?}: expected 1 or 0"),
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_the_calibrated_setup() {
        let cfg = Config::default();
        assert_eq!((cfg.frame_width, cfg.frame_height), (801, 636));
        assert_eq!(cfg.pinch_threshold, 40.0);
        assert_eq!(cfg.click_cooldown, Duration::from_millis(500));
        assert_eq!(cfg.click_policy, ClickPolicy::ReleaseToRearm);
        assert!(cfg.detector_command.is_none());
    }

    #[test]
    fn env_overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            (ENV_CAMERA, "2"),
            (ENV_DETECTOR, "python3  scripts/hand_detect.py"),
            (ENV_REPEAT, "1"),
        ]));
        assert_eq!(cfg.camera_index, 2);
        assert_eq!(
            cfg.detector_command,
            Some(vec!["python3".to_string(), "scripts/hand_detect.py".to_string()])
        );
        assert_eq!(cfg.click_policy, ClickPolicy::AutoRepeat);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[
            (ENV_CAMERA, "front"),
            (ENV_DETECTOR, "   "),
            (ENV_REPEAT, "sometimes"),
        ]));
        assert_eq!(cfg.camera_index, 0);
        assert!(cfg.detector_command.is_none());
        assert_eq!(cfg.click_policy, ClickPolicy::ReleaseToRearm);
    }
}
