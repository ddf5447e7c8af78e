#![allow(dead_code)]

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use liftgate::{
    config::Config,
    core::{Authenticator, AuthorizedRegistry, EmbeddingProvider},
    dev_mode::DevMode,
    error::{GateError, Result},
    server::AppState,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Deterministic stand-in for a face model: the embedding is the summed RGB
/// of the image, so images of the same hue score ~1.0 against each other.
/// An all-black image has no "face".
pub struct ColorEmbedder;

impl EmbeddingProvider for ColorEmbedder {
    fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let rgb = image.to_rgb8();
        let mut sum = [0f32; 3];
        for p in rgb.pixels() {
            for c in 0..3 {
                sum[c] += p[c] as f32;
            }
        }
        if sum.iter().all(|v| *v == 0.0) {
            return Err(GateError::NoFaceDetected);
        }
        Ok(sum.to_vec())
    }
}

pub const RED: [u8; 3] = [210, 20, 20];
pub const GREEN: [u8; 3] = [20, 200, 30];
pub const BLUE: [u8; 3] = [10, 15, 230];

pub fn solid(color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb(color)))
}

pub fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let mut buf = Vec::new();
    solid(color)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    buf
}

pub fn write_png(dir: &Path, name: &str, color: [u8; 3]) {
    std::fs::write(dir.join(name), png_bytes(color)).unwrap();
}

/// Registry with `alice` (red) and `bob` (green).
pub fn registry() -> AuthorizedRegistry {
    AuthorizedRegistry::from_entries(vec![
        ("alice".to_string(), vec![1.0, 0.05, 0.05]),
        ("bob".to_string(), vec![0.05, 1.0, 0.1]),
    ])
}

pub fn app_state() -> Arc<AppState> {
    app_state_with(Config::default())
}

pub fn app_state_with(config: Config) -> Arc<AppState> {
    let authenticator = Authenticator::new(
        &config,
        Arc::new(registry()),
        Arc::new(ColorEmbedder),
        DevMode::disabled(),
    );
    Arc::new(AppState::new(config, authenticator))
}
