// Readback decode and file encoding for captured frames.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use half::f16;

use super::{CaptureKind, PendingCapture, ReadbackImage};
use crate::color::transfer::{hdr_to_scrgb, sdr_to_srgb8, SourceEncoding};
use crate::color::ColorPixelFormat;
use crate::image::{save_exr, save_png, save_thumbnail, ExrCompression};

/// Decode one texel to `[r, g, b, a]` in the surface's own encoding.
fn decode_texel(format: ColorPixelFormat, texel: &[u8]) -> [f32; 4] {
    match format {
        ColorPixelFormat::Bgra8 => [
            texel[2] as f32 / 255.0,
            texel[1] as f32 / 255.0,
            texel[0] as f32 / 255.0,
            texel[3] as f32 / 255.0,
        ],
        ColorPixelFormat::Rgba8 => [
            texel[0] as f32 / 255.0,
            texel[1] as f32 / 255.0,
            texel[2] as f32 / 255.0,
            texel[3] as f32 / 255.0,
        ],
        ColorPixelFormat::Rgb10a2 => {
            let v = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
            [
                (v & 0x3ff) as f32 / 1023.0,
                ((v >> 10) & 0x3ff) as f32 / 1023.0,
                ((v >> 20) & 0x3ff) as f32 / 1023.0,
                (v >> 30) as f32 / 3.0,
            ]
        }
        ColorPixelFormat::Rgba16f => {
            let c = |i: usize| f16::from_le_bytes([texel[i], texel[i + 1]]).to_f32();
            [c(0), c(2), c(4), c(6)]
        }
    }
}

/// Visit every texel of `image` in row-major order.
fn for_each_texel(image: &ReadbackImage, mut f: impl FnMut([f32; 4])) {
    let bpp = image.format.bytes_per_pixel();
    for y in 0..image.height {
        for texel in image.row(y).chunks_exact(bpp) {
            f(decode_texel(image.format, texel));
        }
    }
}

/// HDR delivery: linear scRGB half-float, clamped to `peak_nits`.
pub fn hdr_pixels(image: &ReadbackImage, encoding: SourceEncoding, peak_nits: f32) -> Vec<f16> {
    let mut out = Vec::with_capacity(image.width as usize * image.height as usize * 4);
    for_each_texel(image, |[r, g, b, _]| {
        let [r, g, b] = hdr_to_scrgb([r, g, b], encoding, peak_nits);
        out.extend_from_slice(&[
            f16::from_f32(r),
            f16::from_f32(g),
            f16::from_f32(b),
            f16::ONE,
        ]);
    });
    out
}

/// SDR delivery: sRGB-encoded RGBA8, opaque.
pub fn sdr_pixels(image: &ReadbackImage, encoding: SourceEncoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width as usize * image.height as usize * 4);
    for_each_texel(image, |[r, g, b, _]| {
        let [r, g, b] = sdr_to_srgb8([r, g, b], encoding);
        out.extend_from_slice(&[r, g, b, 255]);
    });
    out
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Encode a captured frame and write it next to `capture.output_stem`.
///
/// Returns the written files.
pub fn write_capture(
    image: &ReadbackImage,
    capture: &PendingCapture,
    thumbnail_max: (u32, u32),
) -> Result<Vec<PathBuf>> {
    ensure!(
        image.width > 0 && image.height > 0,
        "empty readback ({}x{})",
        image.width,
        image.height
    );
    ensure!(
        image.is_complete(),
        "readback buffer too small for {}x{} {:?}",
        image.width,
        image.height,
        image.format
    );

    if let Some(parent) = capture.output_stem.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let encoding = SourceEncoding::from(capture.color_space);
    match capture.kind {
        CaptureKind::Hdr => {
            let path = with_suffix(&capture.output_stem, ".exr");
            let pixels = hdr_pixels(image, encoding, capture.peak_nits);
            save_exr(
                &path,
                &pixels,
                image.width,
                image.height,
                ExrCompression::from_lossless(capture.lossless),
            )?;
            Ok(vec![path])
        }
        CaptureKind::Sdr => {
            let path = with_suffix(&capture.output_stem, ".png");
            let thumb = with_suffix(&capture.output_stem, "_thumb.png");
            let rgba = sdr_pixels(image, encoding);
            save_png(&path, &rgba, image.width, image.height)?;
            save_thumbnail(&thumb, &rgba, image.width, image.height, thumbnail_max)?;
            Ok(vec![path, thumb])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba16f(pixels: &[[f32; 4]]) -> Vec<u8> {
        pixels
            .iter()
            .flat_map(|p| p.iter().flat_map(|&c| f16::from_f32(c).to_le_bytes()))
            .collect()
    }

    #[test]
    fn test_decode_rgb10a2() {
        let v: u32 = 1023 | (512 << 10) | (3 << 30);
        let texel = decode_texel(ColorPixelFormat::Rgb10a2, &v.to_le_bytes());
        assert_eq!(texel[0], 1.0);
        assert!((texel[1] - 512.0 / 1023.0).abs() < 1e-6);
        assert_eq!(texel[2], 0.0);
        assert_eq!(texel[3], 1.0);
    }

    #[test]
    fn test_decode_bgra8() {
        let texel = decode_texel(ColorPixelFormat::Bgra8, &[0, 128, 255, 255]);
        assert_eq!(texel[0], 1.0);
        assert_eq!(texel[2], 0.0);
    }

    #[test]
    fn test_hdr_pixels_clamp_to_peak() {
        // 50.0 scRGB = 4000 nits, clamped to 1000 nits = 12.5 scRGB.
        let image = ReadbackImage {
            width: 2,
            height: 1,
            row_pitch: 16,
            format: ColorPixelFormat::Rgba16f,
            data: rgba16f(&[[50.0, 50.0, 50.0, 1.0], [1.0, 1.0, 1.0, 0.0]]),
        };
        let out = hdr_pixels(&image, SourceEncoding::ScRgb, 1000.0);
        assert_eq!(out.len(), 8);
        assert!((out[0].to_f32() - 12.5).abs() < 0.05);
        assert!((out[4].to_f32() - 1.0).abs() < 0.01);
        assert_eq!(out[7], f16::ONE);
    }

    #[test]
    fn test_sdr_pixels_from_scrgb() {
        let image = ReadbackImage {
            width: 1,
            height: 1,
            row_pitch: 8,
            format: ColorPixelFormat::Rgba16f,
            data: rgba16f(&[[2.0, 1.0, 0.0, 1.0]]),
        };
        assert_eq!(sdr_pixels(&image, SourceEncoding::ScRgb), vec![255, 255, 0, 255]);
    }

    #[test]
    fn test_with_suffix() {
        let stem = Path::new("/tmp/shots/screenshot_20260101_120000_000");
        assert_eq!(
            with_suffix(stem, "_thumb.png"),
            PathBuf::from("/tmp/shots/screenshot_20260101_120000_000_thumb.png")
        );
    }
}
