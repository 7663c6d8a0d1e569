// What you SEE:
// • Mirrored live camera as the base image, with a 4x4 calculator keypad in the middle.
// • Pinch index + middle fingertips over a button to "click" it (it flashes green).
// • The white panel above the keypad shows the expression; "=" evaluates, "C" clears.
// • Without a landmark detector, the mouse stands in for the hand: hold LMB to pinch.
// • Q or ESC quits.

mod bridge;
mod calculator;
mod camera;
mod config;
mod draw;
mod error;
mod expr;
mod gesture;
mod hand;
mod keypad;
mod render;
mod types;

use bridge::DetectorBridge;
use calculator::App;
use camera::CameraCapture;
use config::Config;
use draw::Drawer;
use error::Error;
use hand::{LandmarkProvider, PointerHand};
use std::time::{Duration, Instant};

/// Where hand landmarks come from this run.
enum Tracker {
    Detector(DetectorBridge),
    Pointer(PointerHand),
}

impl Tracker {
    fn from_config(cfg: &Config) -> Self {
        let Some(cmd) = &cfg.detector_command else {
            log::warn!(
                "No landmark detector configured ({}); using the mouse as the hand",
                config::ENV_DETECTOR
            );
            return Tracker::Pointer(PointerHand::new());
        };
        match DetectorBridge::spawn(cmd, cfg.detector_confidence) {
            Ok(bridge) => Tracker::Detector(bridge),
            Err(e) => {
                log::warn!("{e}; using the mouse as the hand");
                Tracker::Pointer(PointerHand::new())
            }
        }
    }

    fn provider(&mut self) -> &mut dyn LandmarkProvider {
        match self {
            Tracker::Detector(d) => d,
            Tracker::Pointer(p) => p,
        }
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Config::from_env();

    /* --- Camera + window setup ---
       Both are released on every exit path when they drop. */
    let mut cam = CameraCapture::new(cfg.camera_index, cfg.frame_width, cfg.frame_height)?;
    let (w, h) = cam.resolution();
    let mut drawer = Drawer::new("Virtual Calculator", w as usize, h as usize)?;

    let mut tracker = Tracker::from_config(&cfg);
    log::info!("Hand source: {}", tracker.provider().name());

    let mut app = App::new(&cfg);

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.quit_pressed() {
        /* 1) Grab a fresh mirrored frame; we draw straight onto it. */
        let mut screen = cam.next_frame()?;
        let now = Instant::now();

        /* 2) Find the hand (at most one). */
        if let Tracker::Pointer(p) = &mut tracker {
            p.feed(drawer.mouse_pos(), drawer.left_mouse_down());
        }
        let detected = tracker.provider().detect(&screen);
        let hand = match detected {
            Ok(hand) => hand,
            Err(e) => {
                log::error!("{e}; switching to the mouse as the hand");
                tracker = Tracker::Pointer(PointerHand::new());
                None
            }
        };

        /* 3) Pinch -> click -> keypad -> expression. */
        let (fw, fh) = (screen.width, screen.height);
        let tips = hand.as_ref().map(|hd| (hd.index_tip(fw, fh), hd.middle_tip(fw, fh)));
        if let Some((index, middle)) = tips {
            log::trace!("index tip {index:?}, middle tip {middle:?}");
        }
        app.step(tips, now);

        /* 4) Draw everything and present. */
        let hud = format!("{} | {} | Q: QUIT", tracker.provider().name(), hud_fps_text);
        render::compose(&mut screen, &app, hand.as_ref(), &hud);
        drawer.present(&screen)?;

        /* 5) FPS counter (debug log + HUD once per second) */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::debug!("FPS: {:.1}", fps);
            hud_fps_text = format!("FPS: {:.1}", fps);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    log::info!("Quit; releasing camera and window");
    Ok(())
}
