use std::collections::HashMap;

use image::RgbaImage;
use raylib::prelude::*;

use crate::constants::FRAME_WIDTH;
use crate::engine::StudioFrame;
use crate::error::{StudioError, StudioResult};
use crate::publish::Channel;
use crate::scene::{Layer, Scene};
use crate::settings::{Canvas, Settings};
use crate::texture_loader::{refresh_texture, same_size, upload_texture};

/// Lines shown on top of the operator screen when debugging.
pub struct DebugInfo {
    pub fps: u32,
    pub frame: u64,
    pub outbox: usize,
    pub source: String,
    pub state: String,
}

/// Turns scenes into pixels: one render texture per output plus the live
/// feed and photo textures they draw from.
pub struct Renderer {
    camera: Canvas,
    projection_canvas: Canvas,
    desktop_canvas: Canvas,
    debug_canvas: Canvas,

    projection_rt: RenderTexture2D,
    desktop_rt: RenderTexture2D,
    debug_rt: RenderTexture2D,

    live: Option<Texture2D>,
    photos: HashMap<u64, Texture2D>, // by capture serial
    font: WeakFont,
}

impl Renderer {
    pub fn new(rl: &mut RaylibHandle, thread: &RaylibThread, settings: &Settings) -> StudioResult<Self> {
        let mut target = |canvas: Canvas| {
            rl.load_render_texture(thread, canvas.width, canvas.height)
                .map_err(|e| StudioError::render(format!("failed to create render texture: {e}")))
        };
        let projection_rt = target(settings.projection_canvas)?;
        let desktop_rt = target(settings.desktop_canvas)?;
        let debug_rt = target(settings.debug_canvas)?;

        Ok(Self {
            camera: settings.camera,
            projection_canvas: settings.projection_canvas,
            desktop_canvas: settings.desktop_canvas,
            debug_canvas: settings.debug_canvas,
            projection_rt,
            desktop_rt,
            debug_rt,
            live: None,
            photos: HashMap::new(),
            font: rl.get_font_default(),
        })
    }

    pub fn texture(&self, channel: Channel) -> &RenderTexture2D {
        match channel {
            Channel::Debug => &self.debug_rt,
            Channel::Projection => &self.projection_rt,
            Channel::Desktop => &self.desktop_rt,
        }
    }

    pub fn update_live(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, frame: &RgbaImage) -> StudioResult<()> {
        match &mut self.live {
            Some(texture) if same_size(texture, frame) => refresh_texture(texture, frame),
            _ => {
                self.live = Some(upload_texture(rl, thread, frame)?);
                Ok(())
            }
        }
    }

    /// Draws the projection and desktop scenes of `frame`.
    pub fn render(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, frame: &StudioFrame) -> StudioResult<()> {
        self.sync_photos(rl, thread, &[&frame.projection, &frame.desktop])?;

        let projection_carets = measure_carets(rl, &frame.projection);
        let desktop_carets = measure_carets(rl, &frame.desktop);

        let camera = self.camera;
        let canvas = self.projection_canvas;
        rl.draw_texture_mode(thread, &mut self.projection_rt, |mut d| {
            draw_scene(&mut d, &frame.projection, canvas, camera, self.live.as_ref(), &self.photos, &self.font, &projection_carets);
        });

        let canvas = self.desktop_canvas;
        rl.draw_texture_mode(thread, &mut self.desktop_rt, |mut d| {
            draw_scene(&mut d, &frame.desktop, canvas, camera, self.live.as_ref(), &self.photos, &self.font, &desktop_carets);
        });

        Ok(())
    }

    /// Lays out the operator screen: live feed, projection and desktop side by side.
    pub fn compose_debug(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, info: Option<&DebugInfo>) {
        let screen = self.debug_canvas;
        let cam = self.camera;
        let proj = self.projection_canvas;
        let desk = self.desktop_canvas;

        rl.draw_texture_mode(thread, &mut self.debug_rt, |mut d| {
            d.clear_background(Color::new(30, 30, 30, 255));

            if let Some(live) = &self.live {
                let (w, h) = (cam.w() / 3.0, cam.h() / 3.0);
                d.draw_texture_pro(
                    live,
                    Rectangle::new(0.0, 0.0, live.width() as f32, live.height() as f32),
                    Rectangle::new(screen.w() - w - 20.0, 20.0, w, h),
                    Vector2::new(0.0, 0.0),
                    0.0,
                    Color::WHITE,
                );
            }

            draw_flipped(
                &mut d,
                &self.projection_rt,
                proj,
                Rectangle::new(20.0, (screen.height / 5 * 2) as f32, proj.w() / 2.0, proj.h() / 2.0),
            );
            draw_flipped(
                &mut d,
                &self.desktop_rt,
                desk,
                Rectangle::new(
                    (screen.width / 5 * 3) as f32 - 30.0,
                    screen.h() / 2.0,
                    desk.w() / 2.0,
                    desk.h() / 2.0,
                ),
            );

            if let Some(info) = info {
                let lines = [
                    "Press F11 to toggle fullscreen, F1 for debug".to_string(),
                    format!("{} fps, frame {}", info.fps, info.frame),
                    format!("There are {} messages in your outbox.", info.outbox),
                    format!("Video: {}", info.source),
                    info.state.clone(),
                ];
                d.draw_rectangle(195, 15, 720, 20 * lines.len() as i32 + 10, Color::new(0, 0, 0, 200));
                for (i, line) in lines.iter().enumerate() {
                    d.draw_text(line, 200, 20 + 20 * i as i32, 16, Color::WHITE);
                }
            }
        });
    }

    /// Shows the operator screen in the window, stretched to fit.
    pub fn present(&self, rl: &mut RaylibHandle, thread: &RaylibThread) {
        let mut d = rl.begin_drawing(thread);
        d.clear_background(Color::BLACK);

        let sw = d.get_screen_width() as f32;
        let sh = d.get_screen_height() as f32;
        draw_flipped(&mut d, &self.debug_rt, self.debug_canvas, Rectangle::new(0.0, 0.0, sw, sh));
    }

    /// Uploads textures for newly seen photos and drops the ones no scene
    /// refers to any more.
    fn sync_photos(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, scenes: &[&Scene]) -> StudioResult<()> {
        let mut referenced = Vec::new();
        for photo in scenes.iter().flat_map(|s| s.photos()) {
            if !self.photos.contains_key(&photo.serial) {
                let texture = upload_texture(rl, thread, &photo.pixels)?;
                self.photos.insert(photo.serial, texture);
            }
            referenced.push(photo.serial);
        }
        self.photos.retain(|serial, _| referenced.contains(serial));
        Ok(())
    }
}

/// Render textures are stored bottom-up; flip them while drawing.
fn draw_flipped<D: RaylibDraw>(d: &mut D, texture: &RenderTexture2D, canvas: Canvas, dest: Rectangle) {
    d.draw_texture_pro(
        texture,
        Rectangle::new(0.0, 0.0, canvas.w(), -canvas.h()),
        dest,
        Vector2::new(0.0, 0.0),
        0.0,
        Color::WHITE,
    );
}

/// Caret x offsets, one per caret layer in scene order.
fn measure_carets(rl: &RaylibHandle, scene: &Scene) -> Vec<f32> {
    scene
        .layers
        .iter()
        .filter_map(|layer| match layer {
            Layer::Caret { after, size, .. } => Some(rl.measure_text(after, *size) as f32),
            _ => None,
        })
        .collect()
}

fn draw_scene<D: RaylibDraw>(
    d: &mut D,
    scene: &Scene,
    canvas: Canvas,
    camera: Canvas,
    live: Option<&Texture2D>,
    photos: &HashMap<u64, Texture2D>,
    font: &WeakFont,
    carets: &[f32],
) {
    d.clear_background(scene.background);

    let transform = scene.transform;
    let canvas_center = transform.apply(Vector2::new(canvas.w() / 2.0, canvas.h() / 2.0));
    let mut carets = carets.iter();

    for layer in &scene.layers {
        match layer {
            Layer::LiveFeed => {
                if let Some(live) = live {
                    d.draw_texture_pro(
                        live,
                        Rectangle::new(0.0, 0.0, live.width() as f32, live.height() as f32),
                        Rectangle::new(canvas_center.x, canvas_center.y, canvas.w(), canvas.h()),
                        Vector2::new(canvas.w() / 2.0, canvas.h() / 2.0),
                        transform.rotation,
                        Color::WHITE,
                    );
                }
            }
            Layer::Photo { photo, pose } => {
                let Some(texture) = photos.get(&photo.serial) else {
                    continue;
                };
                let center = transform.apply(pose.center);
                let rotation = pose.rotation + transform.rotation;
                // Photos always show at camera size, whatever the source resolution.
                let (w, h) = (camera.w(), camera.h());

                let (fw, fh) = ((w + 2.0 * FRAME_WIDTH) * pose.scale, (h + 2.0 * FRAME_WIDTH) * pose.scale);
                d.draw_rectangle_pro(
                    Rectangle::new(center.x, center.y, fw, fh),
                    Vector2::new(fw / 2.0, fh / 2.0),
                    rotation,
                    Color::WHITE,
                );

                let (pw, ph) = (w * pose.scale, h * pose.scale);
                d.draw_texture_pro(
                    texture,
                    Rectangle::new(0.0, 0.0, texture.width() as f32, texture.height() as f32),
                    Rectangle::new(center.x, center.y, pw, ph),
                    Vector2::new(pw / 2.0, ph / 2.0),
                    rotation,
                    Color::WHITE,
                );
            }
            Layer::Overlay(color) => {
                d.draw_rectangle_pro(
                    Rectangle::new(canvas_center.x, canvas_center.y, canvas.w(), canvas.h()),
                    Vector2::new(canvas.w() / 2.0, canvas.h() / 2.0),
                    transform.rotation,
                    *color,
                );
            }
            Layer::Text { text, position, size, color } => {
                let at = transform.apply(*position);
                let size = *size as f32;
                d.draw_text_pro(
                    font,
                    text,
                    at,
                    Vector2::new(0.0, 0.0),
                    transform.rotation,
                    size,
                    size / 10.0,
                    *color,
                );
            }
            Layer::Caret { position, height, color, .. } => {
                let width = carets.next().copied().unwrap_or(0.0);
                let at = transform.apply(Vector2::new(position.x + width + 5.0, position.y));
                d.draw_rectangle_pro(
                    Rectangle::new(at.x, at.y, 2.0, *height),
                    Vector2::new(0.0, 0.0),
                    transform.rotation,
                    *color,
                );
            }
        }
    }
}
