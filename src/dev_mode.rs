use std::path::PathBuf;
use std::fs;
use image::DynamicImage;
use rand::Rng;
use crate::error::Result;
use crate::paths::DEV_DATA_DIR;

/// Development mode keeps a copy of every upload and its preprocessed form so
/// match failures can be inspected afterwards. Each request gets its own file
/// names; nothing is shared between concurrent requests.
#[derive(Debug, Clone)]
pub struct DevMode {
    enabled: bool,
    base_dir: PathBuf,
}

impl DevMode {
    pub fn new(enabled: bool) -> Result<Self> {
        Self::with_base_dir(enabled, PathBuf::from(DEV_DATA_DIR))
    }

    pub fn with_base_dir(enabled: bool, base_dir: PathBuf) -> Result<Self> {
        if enabled {
            fs::create_dir_all(base_dir.join("captures"))?;
            tracing::info!("Development mode enabled - captures will be saved to: {}",
                           base_dir.display());
        }

        Ok(Self { enabled, base_dir })
    }

    pub fn disabled() -> Self {
        Self { enabled: false, base_dir: PathBuf::new() }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn captures_dir(&self) -> Option<PathBuf> {
        self.enabled.then(|| self.base_dir.join("captures"))
    }

    /// Returns a fresh capture path, `None` outside dev mode.
    pub fn capture_path(&self, prefix: &str) -> Option<PathBuf> {
        let dir = self.captures_dir()?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let suffix: u32 = rand::thread_rng().gen();
        Some(dir.join(format!("{}_{}_{:08x}.png", prefix, timestamp, suffix)))
    }

    /// Saves `image` under a fresh capture path. Failures are logged, never
    /// propagated: a debug copy must not fail the request it belongs to.
    pub fn save_capture(&self, prefix: &str, image: &DynamicImage) -> Option<PathBuf> {
        let path = self.capture_path(prefix)?;
        match image.save(&path) {
            Ok(()) => {
                tracing::debug!("Saved {} capture to {:?}", prefix, path);
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Failed to save {} capture: {}", prefix, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn disabled_mode_never_writes() {
        let dev = DevMode::disabled();
        assert!(dev.capture_path("upload").is_none());
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(dev.save_capture("upload", &img).is_none());
    }

    #[test]
    fn capture_paths_are_unique_per_call() {
        let tmp = tempfile::tempdir().unwrap();
        let dev = DevMode::with_base_dir(true, tmp.path().to_path_buf()).unwrap();
        let a = dev.capture_path("upload").unwrap();
        let b = dev.capture_path("upload").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with(tmp.path().join("captures")));
    }

    #[test]
    fn enabled_mode_saves_image() {
        let tmp = tempfile::tempdir().unwrap();
        let dev = DevMode::with_base_dir(true, tmp.path().to_path_buf()).unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let saved = dev.save_capture("preprocessed", &img).unwrap();
        assert!(saved.exists());
    }
}
