use std::rc::Rc;

use raylib::ease;
use raylib::prelude::*;

use crate::capture::PhotoCapture;
use crate::constants::*;
use crate::scene::{Layer, Pose, Scene, with_alpha};
use crate::settings::{Canvas, Settings};
use crate::state::{ProjectionPhase, ProjectionTimeline};

struct ActiveProjection {
    start_frame: u64,
    photo: Rc<PhotoCapture>,
}

/// Output of one projection tick.
pub struct ProjectionFrame {
    pub scene: Scene,
    /// Set on the single tick where the cycle finishes.
    pub completed: bool,
}

/// Drives the wall projection: live feed while idle, then the flash, hold,
/// fall and fade back once a photo has been taken.
pub struct ProjectionSequencer {
    timeline: ProjectionTimeline,
    canvas: Canvas,
    tilt_multiplier: f32,
    active: Option<ActiveProjection>,
}

impl ProjectionSequencer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeline: settings.projection,
            canvas: settings.projection_canvas,
            tilt_multiplier: settings.capture.tilt_multiplier,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self, frame: u64, photo: Rc<PhotoCapture>) {
        tracing::debug!(frame, until = frame + self.timeline.total(), "projection started");
        self.active = Some(ActiveProjection {
            start_frame: frame,
            photo,
        });
    }

    pub fn tick(&mut self, frame: u64) -> ProjectionFrame {
        let Some(active) = &self.active else {
            return ProjectionFrame {
                scene: self.live_scene(),
                completed: false,
            };
        };

        let t = frame.saturating_sub(active.start_frame);
        let photo = Rc::clone(&active.photo);
        let mut scene = Scene::new(Color::BLACK);

        match self.timeline.phase(t) {
            ProjectionPhase::WhiteFade(progress) => {
                scene.push(self.photo_layer(photo, 0.0, 0.0));
                scene.push(Layer::Overlay(with_alpha(Color::WHITE, 1.0 - progress)));
            }
            ProjectionPhase::Hold => {
                scene.push(self.photo_layer(photo, 0.0, 0.0));
            }
            ProjectionPhase::Fall(progress) => {
                let lowered = ease::cubic_in(progress, 0.0, 1.0, 1.0);
                scene.push(self.photo_layer(photo, lowered, progress));
            }
            ProjectionPhase::BlackFade(progress) => {
                scene.push(Layer::LiveFeed);
                scene.push(Layer::Overlay(with_alpha(Color::BLACK, 1.0 - progress)));
            }
            ProjectionPhase::Done => {
                tracing::debug!(frame, "projection cycle complete");
                self.active = None;
                return ProjectionFrame {
                    scene: self.live_scene(),
                    completed: true,
                };
            }
        }

        ProjectionFrame {
            scene,
            completed: false,
        }
    }

    fn live_scene(&self) -> Scene {
        let mut scene = Scene::new(Color::BLACK);
        scene.push(Layer::LiveFeed);
        scene
    }

    /// Photo at its resting place, moved down by the eased `lowered` and
    /// straightened linearly with `straighten`.
    fn photo_layer(&self, photo: Rc<PhotoCapture>, lowered: f32, straighten: f32) -> Layer {
        let center = Vector2::new(
            self.canvas.w() / 2.0,
            self.canvas.h() / 2.0 + lowered * self.canvas.h() * FALL_DISTANCE,
        );
        let rotation = photo.tilt - straighten * photo.tilt * self.tilt_multiplier;
        Layer::Photo {
            photo,
            pose: Pose {
                center,
                rotation,
                scale: PROJ_IMG_SCALE,
            },
        }
    }
}
