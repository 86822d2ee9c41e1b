use std::rc::Rc;

use rand::Rng;
use raylib::ease;
use raylib::prelude::*;

use crate::capture::PhotoCapture;
use crate::constants::*;
use crate::scene::{Layer, Pose, Scene, Transform, with_alpha};
use crate::settings::{Canvas, Settings};
use crate::state::DesktopTimeline;

/// Keyboard input the desktop interface understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Delete,
    Enter,
}

struct OutSequence {
    start_frame: u64,
    tilt: f32,
}

struct ActiveDesktop {
    start_frame: u64,
    photo: Rc<PhotoCapture>,
    tilt: f32,
    recipient: String,
    send_requested: bool,
    out: Option<OutSequence>,
}

/// Output of one desktop tick.
pub struct DesktopFrame {
    pub scene: Scene,
    /// Recipient to mail the photo to, set on the tick a non-empty address
    /// was confirmed.
    pub send_to: Option<String>,
}

/// The visitor-facing screen: the photo settles in, an address is typed,
/// and everything slides away once it is confirmed.
pub struct DesktopSequencer {
    timeline: DesktopTimeline,
    canvas: Canvas,
    tilt_multiplier: f32,
    active: Option<ActiveDesktop>,
}

impl DesktopSequencer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeline: settings.desktop,
            canvas: settings.desktop_canvas,
            tilt_multiplier: settings.capture.tilt_multiplier,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_leaving(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.out.is_some())
    }

    pub fn recipient(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.recipient.as_str())
    }

    /// Starts a fresh interface for `photo`, discarding any previous one.
    pub fn activate(&mut self, frame: u64, photo: Rc<PhotoCapture>) {
        let tilt = photo.desktop_tilt(self.tilt_multiplier);
        self.active = Some(ActiveDesktop {
            start_frame: frame,
            photo,
            tilt,
            recipient: String::new(),
            send_requested: false,
            out: None,
        });
    }

    /// Ignored while inactive and once the out-sequence has begun.
    pub fn handle_key(&mut self, key: Key) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.out.is_some() {
            return;
        }
        match key {
            Key::Char(c) if (' '..='~').contains(&c) => active.recipient.push(c),
            Key::Char(_) => {}
            Key::Delete => {
                active.recipient.pop();
            }
            Key::Enter => active.send_requested = true,
        }
    }

    pub fn tick(&mut self, frame: u64, rng: &mut impl Rng) -> DesktopFrame {
        let idle = DesktopFrame {
            scene: Scene::new(Color::BLACK),
            send_to: None,
        };
        let Some(active) = self.active.as_mut() else {
            return idle;
        };

        let mut send_to = None;
        if std::mem::take(&mut active.send_requested) {
            active.out = Some(OutSequence {
                start_frame: frame,
                tilt: rng.random_range(-OUT_MAX_TILT..=OUT_MAX_TILT),
            });
            if !active.recipient.is_empty() {
                send_to = Some(active.recipient.clone());
            }
        }

        let mut scene = Scene::new(Color::BLACK);

        if let Some(out) = &active.out {
            match self.timeline.out_progress(frame.saturating_sub(out.start_frame)) {
                Some(progress) => {
                    let push = ease::quad_in(progress, 0.0, 1.0, 1.0);
                    scene.transform = Transform {
                        offset: Vector2::new(push * self.canvas.w(), 0.0),
                        rotation: push * out.tilt,
                    };
                }
                None => {
                    tracing::debug!(frame, "desktop interface closed");
                    self.active = None;
                    return idle;
                }
            }
        }

        let t = frame.saturating_sub(active.start_frame);
        let anchor = Vector2::new(self.canvas.w() / 2.0, self.canvas.h() / 2.0 * 0.8);

        let pose = match self.timeline.descent_remaining(t) {
            Some(remaining) => {
                let lift = ease::cubic_in(remaining, 0.0, 1.0, 1.0);
                Pose {
                    center: Vector2::new(anchor.x, anchor.y - lift * self.canvas.h() * FALL_DISTANCE),
                    rotation: 2.0 * (lift - 0.5) * active.tilt,
                    scale: DESK_IMG_SCALE,
                }
            }
            None => Pose {
                center: anchor,
                rotation: -active.tilt,
                scale: DESK_IMG_SCALE,
            },
        };
        scene.push(Layer::Photo {
            photo: Rc::clone(&active.photo),
            pose,
        });

        if let Some(alpha) = self.timeline.text_alpha(t) {
            let color = with_alpha(Color::WHITE, alpha);
            let px = (self.canvas.width / 8) as f32;
            let py = (self.canvas.height / 5 * 4 + 25) as f32;

            scene.push(Layer::Text {
                text: EMAIL_PROMPT.to_string(),
                position: Vector2::new(px, py - 20.0 - SMALL_FONT as f32),
                size: SMALL_FONT,
                color,
            });
            scene.push(Layer::Text {
                text: active.recipient.clone(),
                position: Vector2::new(px, py + 5.0),
                size: LARGE_FONT,
                color,
            });

            if active.out.is_none() && self.timeline.caret_visible(t) {
                scene.push(Layer::Caret {
                    after: active.recipient.clone(),
                    position: Vector2::new(px, py + 10.0),
                    size: LARGE_FONT,
                    height: (LARGE_FONT + 15) as f32,
                    color,
                });
            }
        }

        DesktopFrame { scene, send_to }
    }
}
