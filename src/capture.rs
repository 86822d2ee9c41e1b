use std::time::Duration;

use image::RgbaImage;
use rand::Rng;

/// A photo taken from the live feed. Never modified after creation; the
/// sequencers share it until the next accepted capture replaces it.
#[derive(Debug)]
pub struct PhotoCapture {
    pub pixels: RgbaImage,
    pub frame: u64,
    pub tilt: f32,  // degrees
    pub serial: u64,
}

impl PhotoCapture {
    /// Tilt the desktop keeps once the projection has straightened the photo.
    pub fn desktop_tilt(&self, tilt_multiplier: f32) -> f32 {
        self.tilt * (1.0 - tilt_multiplier)
    }
}

/// Uniform tilt in `[-max_tilt, max_tilt]` degrees.
pub fn random_tilt(rng: &mut impl Rng, max_tilt: f32) -> f32 {
    if max_tilt <= 0.0 {
        return 0.0;
    }
    rng.random_range(-max_tilt..=max_tilt)
}

/// Edge-triggered capture request with a debounce window measured in wall
/// time since the last accepted capture.
#[derive(Debug)]
pub struct CaptureTrigger {
    debounce: Duration,
    pending: bool,
    last_accepted: Option<Duration>,
}

impl CaptureTrigger {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: false,
            last_accepted: None,
        }
    }

    pub fn request(&mut self) {
        self.pending = true;
    }

    /// Clears and returns the pending flag.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Accepts a capture at `now` unless the previous one is too recent.
    pub fn try_accept(&mut self, now: Duration) -> bool {
        let ready = match self.last_accepted {
            Some(last) => now.saturating_sub(last) >= self.debounce,
            None => true,
        };
        if ready {
            self.last_accepted = Some(now);
        }
        ready
    }
}
