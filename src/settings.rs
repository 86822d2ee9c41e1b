use std::path::PathBuf;
use std::time::Duration;

use crate::constants::*;
use crate::state::{DesktopTimeline, ProjectionTimeline};

/// Pixel size of one output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn w(&self) -> f32 {
        self.width as f32
    }

    pub fn h(&self) -> f32 {
        self.height as f32
    }
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub debounce: Duration,
    pub max_tilt: f32,
    pub tilt_multiplier: f32,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub sender: String,
    pub default_recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub photo_dir: PathBuf,
    pub latest_name: String,
    pub outbox_dir: PathBuf,
}

/// Everything the installation can be tuned with. Defaults come from
/// `constants.rs`; the command line only overrides paths and toggles.
#[derive(Debug, Clone)]
pub struct Settings {
    pub camera: Canvas,
    pub projection_canvas: Canvas,
    pub desktop_canvas: Canvas,
    pub debug_canvas: Canvas,
    pub projection: ProjectionTimeline,
    pub desktop: DesktopTimeline,
    pub capture: CaptureSettings,
    pub mail: MailSettings,
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera: Canvas::new(CAM_WIDTH, CAM_HEIGHT),
            projection_canvas: Canvas::new(PROJ_WIDTH, PROJ_HEIGHT),
            desktop_canvas: Canvas::new(DESK_WIDTH, DESK_HEIGHT),
            debug_canvas: Canvas::new(DEBUG_WIDTH, DEBUG_HEIGHT),
            projection: ProjectionTimeline::default(),
            desktop: DesktopTimeline::default(),
            capture: CaptureSettings {
                debounce: Duration::from_millis(DEBOUNCE_MS),
                max_tilt: MAX_TILT,
                tilt_multiplier: TILT_MULT,
            },
            mail: MailSettings {
                sender: SENDER_EMAIL.to_string(),
                default_recipient: DEFAULT_RECIPIENT.to_string(),
                subject: MAIL_SUBJECT.to_string(),
                body: MAIL_BODY.to_string(),
            },
            storage: StorageSettings {
                photo_dir: PathBuf::from(PHOTO_DIR),
                latest_name: NEW_PHOTO_NAME.to_string(),
                outbox_dir: PathBuf::from(OUTBOX_DIR),
            },
        }
    }
}
