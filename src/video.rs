use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::StudioResult;
use crate::settings::Canvas;
use crate::texture_loader::load_image_with_exif_rotation;

/// Something that produces live frames. Polled once per tick; `None` means
/// nothing new since the last poll.
pub trait VideoSource {
    fn poll_frame(&mut self) -> Option<RgbaImage>;
    fn describe(&self) -> String;
}

/// Scrolling colour bars, for running without a camera.
pub struct TestPattern {
    size: Canvas,
    offset: u32,
}

impl TestPattern {
    pub fn new(size: Canvas) -> Self {
        Self { size, offset: 0 }
    }
}

const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

impl VideoSource for TestPattern {
    fn poll_frame(&mut self) -> Option<RgbaImage> {
        let width = self.size.width.max(1);
        let bar = (width / BARS.len() as u32).max(1);
        let offset = self.offset;
        self.offset = (self.offset + 2) % width;

        Some(RgbaImage::from_fn(self.size.width, self.size.height, |x, _| {
            let index = (((x + offset) % width) / bar) as usize % BARS.len();
            let [r, g, b] = BARS[index];
            Rgba([r, g, b, 255])
        }))
    }

    fn describe(&self) -> String {
        format!("test pattern {}x{}", self.size.width, self.size.height)
    }
}

/// A single image standing in for the camera, scaled to the camera size.
pub struct StillSource {
    name: String,
    frame: Option<RgbaImage>,
}

impl StillSource {
    pub fn open(path: &Path, camera: Canvas) -> StudioResult<Self> {
        let mut frame = load_image_with_exif_rotation(path)?;
        if frame.dimensions() != (camera.width, camera.height) {
            tracing::debug!(
                path = %path.display(),
                from = ?frame.dimensions(),
                to = ?(camera.width, camera.height),
                "scaling still to camera size"
            );
            frame = imageops::resize(&frame, camera.width, camera.height, FilterType::Triangle);
        }
        Ok(Self {
            name: path.display().to_string(),
            frame: Some(frame),
        })
    }
}

impl VideoSource for StillSource {
    fn poll_frame(&mut self) -> Option<RgbaImage> {
        self.frame.take()
    }

    fn describe(&self) -> String {
        format!("still {}", self.name)
    }
}
