use crate::config::PreprocessConfig;
use image::{imageops, DynamicImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// Normalizes an uploaded capture before it is embedded.
///
/// Steps, in order: drop any alpha channel, mirror left-right (front cameras
/// deliver mirrored frames), unsharp mask, then resize to a
/// `target_size` square.
pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> DynamicImage {
    let rgb = image.to_rgb8();

    let oriented = if config.mirror {
        imageops::flip_horizontal(&rgb)
    } else {
        rgb
    };

    let sharpened = unsharp_mask(
        &oriented,
        config.unsharp_radius,
        config.unsharp_percent,
        config.unsharp_threshold,
    );

    let size = config.target_size;
    let resized = imageops::resize(&sharpened, size, size, imageops::FilterType::CatmullRom);
    DynamicImage::ImageRgb8(resized)
}

/// Classic unsharp mask: `out = in + (in - blur(in)) * percent / 100`, applied
/// per channel only where `|in - blur(in)| >= threshold`.
///
/// `radius` is the Gaussian sigma and must be positive.
pub fn unsharp_mask(image: &RgbImage, radius: f32, percent: i32, threshold: i32) -> RgbImage {
    let blurred = gaussian_blur_f32(image, radius);
    let mut out = image.clone();

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let soft = blurred.get_pixel(x, y);
        for c in 0..3 {
            let original = pixel[c] as i32;
            let diff = original - soft[c] as i32;
            if diff.abs() >= threshold {
                pixel[c] = (original + diff * percent / 100).clamp(0, 255) as u8;
            }
        }
    }

    out
}
