use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

use raylib::prelude::*;

use crate::error::{StudioError, StudioResult};
use crate::publish::{Channel, TexturePublisher};
use crate::settings::Canvas;

/// Streams one channel as raw RGBA into an ffmpeg child process, which
/// encodes it to a file or a network target.
pub struct Ffmpeg {
    channel: Channel,
    target: String,
    canvas: Canvas,
    process: Child,
    stdin: Option<ChildStdin>,
    row: Vec<u8>,
}

impl Ffmpeg {
    pub fn spawn(channel: Channel, canvas: Canvas, fps: u32, target: &str) -> StudioResult<Ffmpeg> {
        let mut process = Command::new("ffmpeg")
            .stdin(Stdio::piped())
            .args(["-loglevel", "error"])
            .arg("-y")
            .args(["-f", "rawvideo"])
            .args(["-pixel_format", "rgba"])
            .args(["-video_size", &format!("{}x{}", canvas.width, canvas.height)])
            .args(["-framerate", &format!("{}", fps)])
            .args(["-i", "-"])
            .args(["-c:v", "libx264"])
            .args(["-preset", "ultrafast"])
            .args(["-pix_fmt", "yuv420p"])
            .args(["-metadata", &format!("title={}", channel.title())])
            .arg(target)
            .spawn()
            .map_err(|e| StudioError::publish(format!("failed to start ffmpeg: {e}")))?;
        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| StudioError::publish("ffmpeg stdin unavailable"))?;

        Ok(Ffmpeg {
            channel,
            target: target.to_string(),
            canvas,
            process,
            stdin: Some(stdin),
            row: Vec::with_capacity(canvas.width as usize * 4),
        })
    }
}

impl TexturePublisher for Ffmpeg {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn describe(&self) -> String {
        format!("ffmpeg {}", self.target)
    }

    fn publish(&mut self, texture: &RenderTexture2D) -> StudioResult<()> {
        let image = texture
            .load_image()
            .map_err(|e| StudioError::publish(format!("failed to read back texture: {e}")))?;
        let colors = image.get_image_data();

        let width = self.canvas.width as usize;
        let height = self.canvas.height as usize;
        if colors.len() < width * height {
            return Err(StudioError::publish("texture smaller than channel canvas"));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| StudioError::publish("ffmpeg stdin closed"))?;

        // Render textures are bottom-up, ffmpeg wants top-down rows.
        for y in (0..height).rev() {
            self.row.clear();
            for c in &colors[y * width..(y + 1) * width] {
                self.row.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
            stdin
                .write_all(&self.row)
                .map_err(|e| StudioError::publish(format!("ffmpeg pipe: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for Ffmpeg {
    fn drop(&mut self) {
        // Closing stdin tells ffmpeg to finish the stream
        self.stdin = None;
        if let Err(e) = self.process.wait() {
            tracing::error!(sink = %self.target, "ffmpeg did not exit cleanly: {e}");
        }
    }
}
