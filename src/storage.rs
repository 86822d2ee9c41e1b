use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};

use crate::constants::PHOTO_PREFIX;
use crate::error::{StudioError, StudioResult};

/// Where a captured photo ended up on disk.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub timestamped: PathBuf,
    pub latest: PathBuf,
}

/// Persists captured photos. The latest photo is always reachable under a
/// fixed name so it can be attached to outgoing mail.
pub trait PhotoStore {
    fn store(&mut self, image: &RgbaImage) -> StudioResult<StoredPhoto>;
    fn latest_path(&self) -> PathBuf;
}

pub struct DiskStore {
    dir: PathBuf,
    latest_name: String,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>, latest_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            latest_name: latest_name.into(),
        }
    }
}

impl PhotoStore for DiskStore {
    fn store(&mut self, image: &RgbaImage) -> StudioResult<StoredPhoto> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            StudioError::storage(format!("failed to create {}: {e}", self.dir.display()))
        })?;

        // Cameras deliver opaque frames; dropping alpha lets the same buffer
        // go to JPEG as well as PNG.
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();

        let timestamped = self.dir.join(timestamped_name(&chrono::Local::now()));
        save(&rgb, &timestamped)?;

        let latest = self.latest_path();
        save(&rgb, &latest)?;

        tracing::info!(path = %timestamped.display(), "photo saved");
        Ok(StoredPhoto { timestamped, latest })
    }

    fn latest_path(&self) -> PathBuf {
        self.dir.join(&self.latest_name)
    }
}

fn save(image: &image::RgbImage, path: &Path) -> StudioResult<()> {
    image
        .save(path)
        .map_err(|e| StudioError::storage(format!("failed to save {}: {e}", path.display())))
}

pub fn timestamped_name<Tz: chrono::TimeZone>(at: &chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{PHOTO_PREFIX}{}.png", at.format("%Y-%m-%d-%H-%M-%S-%3f"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "teeniestudio_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn timestamped_name_has_millis() {
        let at = chrono::Utc
            .with_ymd_and_hms(2024, 3, 9, 18, 5, 7)
            .unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(
            timestamped_name(&at),
            "teeniestudio_2024-03-09-18-05-07-042.png"
        );
    }

    #[test]
    fn store_writes_timestamped_and_latest() {
        let dir = temp_dir("store_writes");
        let mut store = DiskStore::new(&dir, "~newphoto.jpg");

        let image = RgbaImage::from_pixel(8, 6, image::Rgba([200, 40, 10, 255]));
        let stored = store.store(&image).unwrap();

        assert!(stored.timestamped.exists());
        assert_eq!(stored.latest, dir.join("~newphoto.jpg"));
        let latest = image::open(&stored.latest).unwrap();
        assert_eq!((latest.width(), latest.height()), (8, 6));

        let again = store.store(&image).unwrap();
        assert_eq!(again.latest, stored.latest);

        fs::remove_dir_all(&dir).ok();
    }
}
