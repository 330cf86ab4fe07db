pub mod surface;
pub mod transfer;

pub use surface::{surface_for_mode, BufferFormat, ColorSpace, SurfaceDescriptor, SurfaceFamily};

/// Pixel layout of a CPU-visible readback buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPixelFormat {
    Bgra8,
    Rgba8,
    /// R10G10B10A2 packed little-endian, red in the low bits.
    Rgb10a2,
    Rgba16f,
}

impl ColorPixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorPixelFormat::Bgra8 | ColorPixelFormat::Rgba8 | ColorPixelFormat::Rgb10a2 => 4,
            ColorPixelFormat::Rgba16f => 8,
        }
    }
}

impl From<BufferFormat> for ColorPixelFormat {
    fn from(format: BufferFormat) -> Self {
        match format {
            BufferFormat::R10G10B10A2Unorm => ColorPixelFormat::Rgb10a2,
            BufferFormat::R16G16B16A16Float => ColorPixelFormat::Rgba16f,
        }
    }
}
