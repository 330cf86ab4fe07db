// PNG encoding via the `image` crate.
//
// Input is tightly packed RGBA8, already sRGB encoded.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::imageops::{self, FilterType as ResizeFilter};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

fn check_len(rgba: &[u8], width: u32, height: u32) -> Result<()> {
    let expected = width as usize * height as usize * 4;
    ensure!(
        rgba.len() == expected,
        "RGBA8 buffer is {} bytes, expected {} for {}x{}",
        rgba.len(),
        expected,
        width,
        height
    );
    Ok(())
}

/// Save an RGBA8 buffer as PNG.
pub fn save_png(path: &Path, rgba: &[u8], width: u32, height: u32) -> Result<()> {
    check_len(rgba, width, height)?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Fast, FilterType::Sub);
    encoder
        .write_image(rgba, width, height, ExtendedColorType::Rgba8)
        .context("failed to write PNG")?;

    Ok(())
}

/// Largest size with the source aspect ratio that fits `max_width x max_height`.
///
/// Images already within bounds keep their size.
pub fn thumbnail_size(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Save a downscaled copy of an RGBA8 buffer as PNG.
pub fn save_thumbnail(
    path: &Path,
    rgba: &[u8],
    width: u32,
    height: u32,
    max_size: (u32, u32),
) -> Result<()> {
    check_len(rgba, width, height)?;

    let source = RgbaImage::from_raw(width, height, rgba.to_vec())
        .context("thumbnail source buffer has the wrong size")?;
    let (tw, th) = thumbnail_size(width, height, max_size.0, max_size.1);
    let thumb = imageops::resize(&source, tw, th, ResizeFilter::Triangle);

    save_png(path, thumb.as_raw(), tw, th)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_size() {
        assert_eq!(thumbnail_size(3840, 2160, 384, 216), (384, 216));
        assert_eq!(thumbnail_size(1920, 1200, 384, 216), (346, 216));
        assert_eq!(thumbnail_size(3440, 1440, 384, 216), (384, 161));
        assert_eq!(thumbnail_size(200, 100, 384, 216), (200, 100));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let path = std::env::temp_dir().join("hdrcontrol-short.png");
        assert!(save_png(&path, &[0u8; 12], 2, 2).is_err());
    }

    #[test]
    fn test_png_and_thumbnail() {
        let dir = std::env::temp_dir().join(format!("hdrcontrol-basic-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let (w, h) = (800u32, 450u32);
        let rgba: Vec<u8> = (0..w * h).flat_map(|i| [(i % 256) as u8, 64, 128, 255]).collect();

        let png = dir.join("shot.png");
        let thumb = dir.join("shot_thumb.png");
        save_png(&png, &rgba, w, h).unwrap();
        save_thumbnail(&thumb, &rgba, w, h, (384, 216)).unwrap();

        let full = image::open(&png).unwrap();
        assert_eq!((full.width(), full.height()), (800, 450));
        let small = image::open(&thumb).unwrap();
        assert_eq!((small.width(), small.height()), (384, 216));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
