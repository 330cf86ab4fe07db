// OpenEXR (.exr) encoding via the `exr` crate.
//
// HDR screenshots are written as half-float RGBA linear scRGB (BT.709
// primaries, 1.0 = 80 nits), which HDR-aware viewers and editors read
// without extra metadata.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use exr::prelude::*;

/// EXR block compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExrCompression {
    /// ZIP, 16 scan lines per block.
    Lossless,
    /// B44, fixed 4x4 block quantization of half-float channels.
    Lossy,
}

impl ExrCompression {
    pub fn from_lossless(lossless: bool) -> Self {
        if lossless {
            ExrCompression::Lossless
        } else {
            ExrCompression::Lossy
        }
    }

    fn compression(self) -> Compression {
        match self {
            ExrCompression::Lossless => Compression::ZIP16,
            ExrCompression::Lossy => Compression::B44,
        }
    }
}

/// Save interleaved RGBA `f16` pixels as an OpenEXR file.
pub fn save_exr(
    path: &Path,
    pixels: &[f16],
    width: u32,
    height: u32,
    compression: ExrCompression,
) -> Result<()> {
    let (w, h) = (width as usize, height as usize);
    ensure!(
        pixels.len() == w * h * 4,
        "RGBA16F buffer has {} channels, expected {} for {}x{}",
        pixels.len(),
        w * h * 4,
        width,
        height
    );

    let channels = SpecificChannels::rgba(|Vec2(x, y)| {
        let offset = (y * w + x) * 4;
        (
            pixels[offset],
            pixels[offset + 1],
            pixels[offset + 2],
            pixels[offset + 3],
        )
    });

    let encoding = Encoding {
        compression: compression.compression(),
        blocks: Blocks::ScanLines,
        line_order: LineOrder::Increasing,
    };
    let layer = Layer::new((w, h), LayerAttributes::default(), encoding, channels);
    Image::from_layer(layer)
        .write()
        .to_file(path)
        .with_context(|| format!("failed to write EXR {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_selection() {
        assert_eq!(ExrCompression::from_lossless(true), ExrCompression::Lossless);
        assert_eq!(ExrCompression::Lossless.compression(), Compression::ZIP16);
        assert_eq!(ExrCompression::Lossy.compression(), Compression::B44);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = std::env::temp_dir().join(format!("hdrcontrol-exr-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shot.exr");

        let (w, h) = (8u32, 4u32);
        let pixels: Vec<f16> = (0..w * h)
            .flat_map(|i| {
                let v = f16::from_f32(i as f32 * 0.5);
                [v, v, v, f16::ONE]
            })
            .collect();
        save_exr(&path, &pixels, w, h, ExrCompression::Lossless).unwrap();

        let image = read_first_rgba_layer_from_file(
            &path,
            |resolution, _| vec![(0.0f32, 0.0f32); resolution.width() * resolution.height()],
            |buf: &mut Vec<(f32, f32)>, pos, (r, _g, _b, a): (f32, f32, f32, f32)| {
                buf[pos.y() * 8 + pos.x()] = (r, a);
            },
        )
        .unwrap();
        let buf = &image.layer_data.channel_data.pixels;
        assert_eq!(buf[5], (2.5, 1.0));
        assert_eq!(buf[31].1, 1.0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let path = std::env::temp_dir().join("hdrcontrol-bad.exr");
        let pixels = vec![f16::ZERO; 7];
        assert!(save_exr(&path, &pixels, 2, 1, ExrCompression::Lossy).is_err());
    }
}
