use std::fs;
use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag, Value};
use image::RgbaImage;
use raylib::prelude::*;

use crate::error::{StudioError, StudioResult};

// --- Load Image, Apply EXIF Rotation ---
pub fn load_image_with_exif_rotation(image_path: &Path) -> StudioResult<RgbaImage> {
    let file_bytes = fs::read(image_path)
        .map_err(|e| StudioError::video(format!("failed to read {}: {e}", image_path.display())))?;

    let mut orientation = 1; // Default: no rotation

    // Only JPEG files carry EXIF reliably
    let extension = image_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension == "jpg" || extension == "jpeg" {
        match Reader::new().read_from_container(&mut Cursor::new(&file_bytes)) {
            Ok(exif) => {
                if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
                    if let Value::Short(values) = &field.value {
                        if let Some(&value) = values.first() {
                            orientation = value;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %image_path.display(), "no EXIF data: {e}");
            }
        }
    }

    let image = image::load_from_memory(&file_bytes)
        .map_err(|e| StudioError::video(format!("failed to decode {}: {e}", image_path.display())))?;

    // 3 = 180 deg, 6 = 90 deg clockwise, 8 = 90 deg counter-clockwise.
    // Flipped orientations are left alone.
    let image = match orientation {
        3 => image.rotate180(),
        6 => image.rotate90(),
        8 => image.rotate270(),
        _ => image,
    };

    Ok(image.to_rgba8())
}

/// Creates an RGBA texture holding `pixels`.
pub fn upload_texture(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    pixels: &RgbaImage,
) -> StudioResult<Texture2D> {
    let blank = Image::gen_image_color(pixels.width() as i32, pixels.height() as i32, Color::BLACK);
    let mut texture = rl
        .load_texture_from_image(thread, &blank)
        .map_err(|e| StudioError::render(format!("failed to create texture: {e}")))?;
    refresh_texture(&mut texture, pixels)?;
    Ok(texture)
}

/// Replaces the contents of a texture of the same size.
pub fn refresh_texture(texture: &mut Texture2D, pixels: &RgbaImage) -> StudioResult<()> {
    texture
        .update_texture(pixels.as_raw())
        .map_err(|e| StudioError::render(format!("failed to update texture: {e}")))
}

pub fn same_size(texture: &Texture2D, pixels: &RgbaImage) -> bool {
    texture.width() as u32 == pixels.width() && texture.height() as u32 == pixels.height()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    #[test]
    fn png_stills_load_upright() {
        let dir = std::env::temp_dir().join(format!("teeniestudio_still_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("still.png");
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(5, 2, image::Rgba([1, 2, 3, 255])))
            .save(&path)
            .unwrap();

        let loaded = load_image_with_exif_rotation(&path).unwrap();
        assert_eq!(loaded.dimensions(), (5, 2));
        assert_eq!(loaded.get_pixel(0, 0).0, [1, 2, 3, 255]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_still_is_a_video_error() {
        let err = load_image_with_exif_rotation(Path::new("/nope/still.jpg")).unwrap_err();
        assert!(err.to_string().contains("video error:"));
    }
}
