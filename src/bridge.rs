//! Hand landmarks from an external detector process (e.g. a MediaPipe helper).
//!
//! Protocol over the child's stdin/stdout:
//! - on startup the child prints one line, `READY`;
//! - per frame we write three little-endian `u32` (width, height, channels = 3)
//!   followed by `width * height * 3` RGB bytes;
//! - the child answers with one JSON line:
//!   `{"hands":[{"score":0.9,"landmarks":[{"x":..,"y":..}, ...21]}],"error":null}`.
//!
//! The child is killed when the bridge is dropped.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Deserialize;

use crate::error::Error;
use crate::hand::{Hand, Landmark, LandmarkProvider, landmarks};
use crate::types::FrameBuffer;

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default = "full_score")]
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

fn full_score() -> f32 {
    1.0
}

#[derive(Deserialize, Debug)]
struct DetectionReply {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Pick the first usable hand out of one reply line.
fn parse_reply(line: &str, min_score: f32) -> Result<Option<Hand>, Error> {
    let reply: DetectionReply = serde_json::from_str(line.trim())
        .map_err(|e| Error::Detector(format!("Bad reply {:?}: {e}", line.trim())))?;

    if let Some(err) = reply.error {
        log::warn!("Detector reported: {err}");
        return Ok(None);
    }

    for hand in reply.hands {
        if hand.score < min_score {
            log::debug!("Skipping hand with score {:.2}", hand.score);
            continue;
        }
        if hand.landmarks.len() != landmarks::COUNT {
            log::warn!("Expected {} landmarks, got {}", landmarks::COUNT, hand.landmarks.len());
            continue;
        }

        let mut lms = [Landmark::default(); landmarks::COUNT];
        for (dst, src) in lms.iter_mut().zip(&hand.landmarks) {
            *dst = Landmark { x: src.x, y: src.y };
        }
        return Ok(Some(Hand { landmarks: lms }));
    }

    Ok(None)
}

/// Serialize one frame: header + packed RGB bytes.
fn encode_frame(frame: &FrameBuffer, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(12 + frame.pixels.len() * 3);
    out.extend_from_slice(&(frame.width as u32).to_le_bytes());
    out.extend_from_slice(&(frame.height as u32).to_le_bytes());
    out.extend_from_slice(&3u32.to_le_bytes());
    for &px in &frame.pixels {
        // px = 0x00RRGGBB
        out.push(((px >> 16) & 0xFF) as u8);
        out.push(((px >> 8) & 0xFF) as u8);
        out.push((px & 0xFF) as u8);
    }
}

pub struct DetectorBridge {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    min_score: f32,
    scratch: Vec<u8>, // reused frame encoding buffer
    line: String,
}

impl DetectorBridge {
    /// Start `command[0]` with the remaining entries as arguments and wait for `READY`.
    pub fn spawn(command: &[String], min_score: f32) -> Result<Self, Error> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Detector("Empty detector command".into()))?;

        log::info!("Starting landmark detector: {}", command.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Detector(format!("Spawn {program}: {e}")))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            let _ = child.kill();
            return Err(Error::Detector("Child pipes unavailable".into()));
        };

        let mut bridge = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            min_score: min_score.clamp(0.0, 1.0),
            scratch: Vec::new(),
            line: String::new(),
        };

        // Dropping `bridge` on any error below kills the child.
        bridge.read_line()?;
        if bridge.line.trim() != "READY" {
            return Err(Error::Detector(format!(
                "Detector did not signal READY, got {:?}",
                bridge.line.trim()
            )));
        }
        log::info!("Landmark detector ready");
        Ok(bridge)
    }

    fn read_line(&mut self) -> Result<(), Error> {
        self.line.clear();
        let n = self
            .stdout
            .read_line(&mut self.line)
            .map_err(|e| Error::Detector(format!("Read reply: {e}")))?;
        if n == 0 {
            return Err(Error::Detector("Detector closed its output".into()));
        }
        Ok(())
    }
}

impl LandmarkProvider for DetectorBridge {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<Hand>, Error> {
        if frame.pixels.is_empty() {
            return Ok(None);
        }

        encode_frame(frame, &mut self.scratch);
        self.stdin
            .write_all(&self.scratch)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| Error::Detector(format!("Send frame: {e}")))?;

        self.read_line()?;
        parse_reply(&self.line, self.min_score)
    }

    fn name(&self) -> &'static str {
        "detector"
    }
}

impl Drop for DetectorBridge {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn reply_with(score: f32, count: usize) -> String {
        let lms: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"x":{},"y":0.5}}"#, i as f32 / 40.0))
            .collect();
        format!(r#"{{"hands":[{{"score":{score},"landmarks":[{}]}}]}}"#, lms.join(","))
    }

    #[test]
    fn parses_a_full_hand() {
        let hand = parse_reply(&reply_with(0.9, 21), 0.5).unwrap().unwrap();
        assert_eq!(hand.landmarks[8], Landmark { x: 0.2, y: 0.5 });
    }

    #[test]
    fn no_hands_is_none() {
        assert_eq!(parse_reply(r#"{"hands":[]}"#, 0.5).unwrap(), None);
        assert_eq!(parse_reply("{}\n", 0.5).unwrap(), None);
    }

    #[test]
    fn low_confidence_and_partial_hands_are_skipped() {
        assert_eq!(parse_reply(&reply_with(0.2, 21), 0.5).unwrap(), None);
        assert_eq!(parse_reply(&reply_with(0.9, 5), 0.5).unwrap(), None);
    }

    #[test]
    fn reported_error_yields_no_hand() {
        let line = r#"{"hands":[],"error":"model not loaded"}"#;
        assert_eq!(parse_reply(line, 0.5).unwrap(), None);
    }

    #[test]
    fn garbage_is_a_detector_error() {
        assert!(matches!(parse_reply("not json", 0.5), Err(Error::Detector(_))));
    }

    #[test]
    fn frame_encoding_is_header_plus_rgb() {
        let pixels = vec![0x00_11_22_33, 0x00_AA_BB_CC];
        let fb = FrameBuffer { width: 2, height: 1, pixels };
        let mut out = Vec::new();
        encode_frame(&fb, &mut out);
        assert_eq!(&out[0..4], &2u32.to_le_bytes());
        assert_eq!(&out[4..8], &1u32.to_le_bytes());
        assert_eq!(&out[8..12], &3u32.to_le_bytes());
        assert_eq!(&out[12..], &[0x11, 0x22, 0x33, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn far_off_frame_landmarks_stay_near_the_frame() {
        let mut line = reply_with(0.9, 21);
        line = line.replacen(r#""x":0.2"#, r#""x":1e30"#, 1);
        let hand = parse_reply(&line, 0.5).unwrap().unwrap();
        assert_eq!(hand.index_tip(800, 600), Point::new(1600, 300));
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(DetectorBridge::spawn(&[], 0.5), Err(Error::Detector(_))));
    }

    // ----- Talking to a real child process -----

    #[cfg(unix)]
    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    fn spawn_error(command: &[String]) -> String {
        match DetectorBridge::spawn(command, 0.5) {
            Ok(_) => panic!("detector {command:?} should not start"),
            Err(Error::Detector(msg)) => msg,
            Err(e) => panic!("unexpected error kind: {e}"),
        }
    }

    /// 2×2 frame: 12 header bytes + 12 RGB bytes on the wire.
    #[cfg(unix)]
    fn small_frame() -> FrameBuffer {
        FrameBuffer { width: 2, height: 2, pixels: vec![0x00_FF_00_00; 4] }
    }

    #[cfg(unix)]
    #[test]
    fn detects_over_the_pipe_until_the_child_exits() {
        let script = format!(
            "echo READY; head -c 24 >/dev/null; echo '{}'; head -c 24 >/dev/null; echo '{{}}'",
            reply_with(0.9, 21)
        );
        let mut bridge = DetectorBridge::spawn(&sh(&script), 0.5).unwrap();
        assert_eq!(bridge.name(), "detector");

        let hand = bridge.detect(&small_frame()).unwrap().unwrap();
        assert_eq!(hand.landmarks[8], Landmark { x: 0.2, y: 0.5 });
        assert_eq!(bridge.detect(&small_frame()).unwrap(), None);

        // The child is gone now; the next frame surfaces as a detector error.
        assert!(matches!(bridge.detect(&small_frame()), Err(Error::Detector(_))));
    }

    #[cfg(unix)]
    #[test]
    fn empty_frames_are_not_sent() {
        let command = sh("echo READY; exec cat >/dev/null");
        let mut bridge = DetectorBridge::spawn(&command, 0.5).unwrap();
        let empty = FrameBuffer { width: 0, height: 0, pixels: Vec::new() };
        assert_eq!(bridge.detect(&empty).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn handshake_must_be_ready() {
        let msg = spawn_error(&sh("echo HELLO"));
        assert!(msg.contains("READY") && msg.contains("HELLO"), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn child_exiting_before_ready_is_reported() {
        let msg = spawn_error(&sh("exit 0"));
        assert!(msg.contains("closed its output"), "{msg}");
    }

    #[test]
    fn missing_program_is_reported() {
        let msg = spawn_error(&["/nonexistent/hand-detector".to_string()]);
        assert!(msg.starts_with("Spawn /nonexistent/hand-detector"), "{msg}");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn dropping_the_bridge_kills_the_child() {
        let bridge = DetectorBridge::spawn(&sh("echo READY; exec sleep 30"), 0.5).unwrap();
        let proc_dir = std::path::PathBuf::from(format!("/proc/{}", bridge.child.id()));
        assert!(proc_dir.exists());
        drop(bridge);
        assert!(!proc_dir.exists());
    }
}
