use std::rc::Rc;

use raylib::prelude::*;

use crate::capture::PhotoCapture;

/// Placement of a framed photo: centre on the canvas, rotation in degrees
/// (clockwise, y down) and uniform scale.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub center: Vector2,
    pub rotation: f32,
    pub scale: f32,
}

#[derive(Debug, Clone)]
pub enum Layer {
    /// Latest live frame stretched over the whole canvas.
    LiveFeed,
    Photo { photo: Rc<PhotoCapture>, pose: Pose },
    /// Full-canvas rectangle, usually translucent.
    Overlay(Color),
    Text {
        text: String,
        position: Vector2, // top-left
        size: i32,
        color: Color,
    },
    /// Text cursor placed right after `after` as rendered at `position`.
    Caret {
        after: String,
        position: Vector2,
        size: i32,
        height: f32,
        color: Color,
    },
}

/// Rotation about the canvas origin followed by a translation, applied to
/// every layer of a scene.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub offset: Vector2,
    pub rotation: f32,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            offset: Vector2::new(0.0, 0.0),
            rotation: 0.0,
        }
    }

    pub fn apply(&self, p: Vector2) -> Vector2 {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        Vector2::new(
            self.offset.x + p.x * cos - p.y * sin,
            self.offset.y + p.x * sin + p.y * cos,
        )
    }
}

/// What one output canvas shows for one tick.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    pub transform: Transform,
    pub layers: Vec<Layer>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            transform: Transform::identity(),
            layers: Vec::new(),
        }
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn photos(&self) -> impl Iterator<Item = &Rc<PhotoCapture>> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Photo { photo, .. } => Some(photo),
            _ => None,
        })
    }
}

#[cfg(test)]
impl Scene {
    pub fn shows_live_feed(&self) -> bool {
        self.layers.iter().any(|l| matches!(l, Layer::LiveFeed))
    }

    /// Pose of the first photo layer, if any.
    pub fn photo_pose(&self) -> Option<Pose> {
        self.layers.iter().find_map(|l| match l {
            Layer::Photo { pose, .. } => Some(*pose),
            _ => None,
        })
    }

    pub fn overlay(&self) -> Option<Color> {
        self.layers.iter().find_map(|l| match l {
            Layer::Overlay(color) => Some(*color),
            _ => None,
        })
    }
}

/// `color` with its alpha replaced by `alpha` in `[0, 1]`.
pub fn with_alpha(color: Color, alpha: f32) -> Color {
    Color::new(
        color.r,
        color.g,
        color.b,
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_rotates_about_origin_then_translates() {
        let t = Transform {
            offset: Vector2::new(10.0, 0.0),
            rotation: 90.0,
        };
        let p = t.apply(Vector2::new(1.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-4);
        assert!((p.y - 1.0).abs() < 1e-4);
        let same = Transform::identity().apply(Vector2::new(3.0, 4.0));
        assert_eq!((same.x, same.y), (3.0, 4.0));
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(with_alpha(Color::WHITE, 2.0).a, 255);
        assert_eq!(with_alpha(Color::WHITE, -1.0).a, 0);
        assert_eq!(with_alpha(Color::BLACK, 0.5).a, 127);
    }
}
