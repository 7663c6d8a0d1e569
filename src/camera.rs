// Opens the camera and hands out mirrored frames in the calculator's frame space.
// Visual expectation: moving your hand right moves it right on screen (like a mirror),
// and every frame has exactly the configured size no matter what the device delivers.

use crate::error::Error;
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use image::{RgbImage, imageops};

// A small wrapper around nokhwa::Camera so the main loop stays clean.
// Dropping it stops the stream and releases the device.
pub struct CameraCapture {
    cam: Camera,
    out_width: u32,
    out_height: u32,
}

impl CameraCapture {
    /// Open camera `index`, asking for the closest format to `width` x `height`.
    /// Frames are always delivered at `width` x `height`.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera {index}: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        let actual = cam.resolution();
        log::info!(
            "Camera {index} streaming {}x{} (frames scaled to {width}x{height})",
            actual.width(),
            actual.height()
        );

        Ok(Self { cam, out_width: width, out_height: height })
    }

    /// Block for one frame, mirror it and scale it to the output size.
    pub fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        // Rebuild through raw bytes so we don't depend on nokhwa's `image` version.
        let (w, h) = rgb_img.dimensions();
        let img = RgbImage::from_raw(w, h, rgb_img.into_raw())
            .ok_or_else(|| Error::CameraFrame(format!("Short RGB buffer for {w}x{h}")))?;

        Ok(to_screen(img, self.out_width, self.out_height))
    }

    /// Size of every frame `next_frame` returns.
    pub fn resolution(&self) -> (u32, u32) {
        (self.out_width, self.out_height)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            log::warn!("Stopping camera stream: {e}");
        }
    }
}

/// Mirror horizontally, resize if needed, and pack as 0x00RRGGBB.
fn to_screen(mut img: RgbImage, width: u32, height: u32) -> FrameBuffer {
    imageops::flip_horizontal_in_place(&mut img);
    if img.dimensions() != (width, height) {
        img = imageops::resize(&img, width, height, imageops::FilterType::Triangle);
    }

    let (w, h) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect();

    FrameBuffer { width: w as usize, height: h as usize, pixels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn frames_are_mirrored_and_packed() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0x11, 0x22, 0x33]));
        img.put_pixel(1, 0, Rgb([0xAA, 0xBB, 0xCC]));

        let fb = to_screen(img, 2, 1);
        assert_eq!((fb.width, fb.height), (2, 1));
        assert_eq!(fb.pixels, vec![0x00_AA_BB_CC, 0x00_11_22_33]);
    }

    #[test]
    fn frames_are_scaled_to_the_output_size() {
        let img = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));
        let fb = to_screen(img, 8, 6);
        assert_eq!((fb.width, fb.height), (8, 6));
        assert_eq!(fb.pixels.len(), 48);
        assert!(fb.pixels.iter().all(|&p| p == 0x00_0A_14_1E));
    }
}
