pub const FPS: u32 = 60;                       // Target render ticks per second

// --- Canvases ---
pub const CAM_WIDTH: u32 = 640;                // Live feed and photo size
pub const CAM_HEIGHT: u32 = 480;
pub const PROJ_WIDTH: u32 = 1024;              // Wall projection
pub const PROJ_HEIGHT: u32 = 768;
pub const DESK_WIDTH: u32 = 832;               // Visitor desktop screen
pub const DESK_HEIGHT: u32 = 624;
pub const DEBUG_WIDTH: u32 = 1280;             // Operator composite
pub const DEBUG_HEIGHT: u32 = 720;

// --- Capture ---
pub const DEBOUNCE_MS: u64 = 500;              // Minimum time between accepted photos
pub const MAX_TILT: f32 = 15.0;                // Degrees
pub const TILT_MULT: f32 = 0.8;                // Share of the tilt undone while falling

// --- Projection timeline (frames) ---
pub const WHITE_FADE_LENGTH: u64 = 100;
pub const HOLD_IMG_LENGTH: u64 = 100;
pub const FALL_IMG_LENGTH: u64 = 120;
pub const BLACK_FADE_LENGTH: u64 = 60;
pub const FALL_DISTANCE: f32 = 1.25;           // Canvas heights travelled by a falling photo

// --- Desktop timeline (frames) ---
pub const DESCEND_LENGTH: u64 = 120;
pub const EMAIL_WAIT_LENGTH: u64 = 100;
pub const EMAIL_IN_LENGTH: u64 = 30;
pub const OUT_LENGTH: u64 = 80;
pub const CARET_BLINK: u64 = 30;
pub const OUT_MAX_TILT: f32 = 15.0;            // Degrees

// --- Photo framing ---
pub const FRAME_WIDTH: f32 = 8.0;
pub const PROJ_IMG_SCALE: f32 = 0.7;
pub const DESK_IMG_SCALE: f32 = 0.5;

// --- Text ---
pub const LARGE_FONT: i32 = 35;
pub const SMALL_FONT: i32 = 15;
pub const EMAIL_PROMPT: &str = "Type Your Email  (press enter to send)";

// --- Mail ---
pub const SENDER_EMAIL: &str = "teeniestudio@gmail.com";
pub const DEFAULT_RECIPIENT: &str = "teeniestudio@gmail.com";
pub const MAIL_SUBJECT: &str = "Your Photo as Arrived!";
pub const MAIL_BODY: &str = "Enjoy!\n-Teenie Studio";
pub const X_MAILER: &str = "teeniestudio";

// --- Files ---
pub const PHOTO_DIR: &str = "photos";
pub const PHOTO_PREFIX: &str = "teeniestudio_";
pub const NEW_PHOTO_NAME: &str = "~newphoto.jpg";
pub const OUTBOX_DIR: &str = "outbox";
