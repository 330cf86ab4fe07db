// Output surface format and color-space mapping.
//
// Both the buffer format and the color-space tag are read out of the same
// table row, so a wide-gamut format can never be paired with a narrow tag.

use crate::display::EffectiveDisplayMode;

/// Swapchain/back buffer pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferFormat {
    R10G10B10A2Unorm,
    R16G16B16A16Float,
}

/// Swapchain color-space tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Gamma ~2.2, BT.709 primaries.
    RgbFullG22P709,
    /// SMPTE ST 2084 (PQ), BT.2020 primaries.
    RgbFullG2084P2020,
    /// Linear, BT.709 primaries, values may exceed 1.0 (scRGB).
    RgbFullG10P709,
}

/// Surface family. A format and a color-space tag are compatible only when
/// they report the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceFamily {
    /// 8-10 bit integer surface.
    Narrow,
    /// Half-float surface.
    Wide,
}

impl BufferFormat {
    pub fn family(self) -> SurfaceFamily {
        match self {
            BufferFormat::R10G10B10A2Unorm => SurfaceFamily::Narrow,
            BufferFormat::R16G16B16A16Float => SurfaceFamily::Wide,
        }
    }

    /// Numeric `DXGI_FORMAT` value.
    pub fn dxgi_format(self) -> u32 {
        match self {
            BufferFormat::R10G10B10A2Unorm => 24,
            BufferFormat::R16G16B16A16Float => 10,
        }
    }
}

impl ColorSpace {
    pub fn family(self) -> SurfaceFamily {
        match self {
            ColorSpace::RgbFullG22P709 | ColorSpace::RgbFullG2084P2020 => SurfaceFamily::Narrow,
            ColorSpace::RgbFullG10P709 => SurfaceFamily::Wide,
        }
    }

    /// Numeric `DXGI_COLOR_SPACE_TYPE` value.
    pub fn dxgi_color_space(self) -> u32 {
        match self {
            ColorSpace::RgbFullG22P709 => 0,
            ColorSpace::RgbFullG10P709 => 1,
            ColorSpace::RgbFullG2084P2020 => 12,
        }
    }

    /// Whether the tag describes a high dynamic range encoding.
    pub fn is_hdr(self) -> bool {
        !matches!(self, ColorSpace::RgbFullG22P709)
    }
}

/// One row of the mode → surface table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub format: BufferFormat,
    pub color_space: ColorSpace,
}

impl SurfaceDescriptor {
    pub fn family(&self) -> SurfaceFamily {
        self.format.family()
    }
}

/// Map an effective display mode to its output surface.
///
/// | mode | format | color space |
/// |---|---|---|
/// | `Sdr` | R10G10B10A2 | G22 P709 |
/// | `Hdr10` | R10G10B10A2 | G2084 P2020 |
/// | `SdrOnWide`, `ScRgb` | R16G16B16A16 float | G10 P709 |
pub const fn surface_for_mode(mode: EffectiveDisplayMode) -> SurfaceDescriptor {
    match mode {
        EffectiveDisplayMode::Sdr => SurfaceDescriptor {
            format: BufferFormat::R10G10B10A2Unorm,
            color_space: ColorSpace::RgbFullG22P709,
        },
        EffectiveDisplayMode::Hdr10 => SurfaceDescriptor {
            format: BufferFormat::R10G10B10A2Unorm,
            color_space: ColorSpace::RgbFullG2084P2020,
        },
        EffectiveDisplayMode::SdrOnWide | EffectiveDisplayMode::ScRgb => SurfaceDescriptor {
            format: BufferFormat::R16G16B16A16Float,
            color_space: ColorSpace::RgbFullG10P709,
        },
    }
}
