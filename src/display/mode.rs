// Display mode resolution.
//
// The effective mode is a pure function of the requested mode, the SDR
// override, pending screenshot flags and the active frame-generation tech.

/// User-requested output mode, persisted as 0/1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayMode {
    #[default]
    Sdr,
    Hdr10Pq,
    HdrScRgb,
}

impl DisplayMode {
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Sdr),
            1 => Some(Self::Hdr10Pq),
            2 => Some(Self::HdrScRgb),
            _ => None,
        }
    }

    pub fn index(self) -> i32 {
        match self {
            Self::Sdr => 0,
            Self::Hdr10Pq => 1,
            Self::HdrScRgb => 2,
        }
    }

    pub fn is_hdr(self) -> bool {
        self != Self::Sdr
    }
}

/// Frame-generation technology reported by the host renderer.
///
/// `VendorA` is the interpolator that requires an HDR10 surface unless the
/// compatibility shim is loaded; `VendorB` requires a half-float surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameGenerationTech {
    #[default]
    None,
    VendorA,
    VendorB,
}

impl FrameGenerationTech {
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => Self::VendorA,
            2 => Self::VendorB,
            _ => Self::None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::None => 0,
            Self::VendorA => 1,
            Self::VendorB => 2,
        }
    }
}

/// Applied output mode for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveDisplayMode {
    /// SDR tone output presented through a half-float surface.
    SdrOnWide,
    Sdr,
    Hdr10,
    ScRgb,
}

impl EffectiveDisplayMode {
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            -1 => Some(Self::SdrOnWide),
            0 => Some(Self::Sdr),
            1 => Some(Self::Hdr10),
            2 => Some(Self::ScRgb),
            _ => None,
        }
    }

    pub fn index(self) -> i32 {
        match self {
            Self::SdrOnWide => -1,
            Self::Sdr => 0,
            Self::Hdr10 => 1,
            Self::ScRgb => 2,
        }
    }
}

impl From<DisplayMode> for EffectiveDisplayMode {
    fn from(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Sdr => Self::Sdr,
            DisplayMode::Hdr10Pq => Self::Hdr10,
            DisplayMode::HdrScRgb => Self::ScRgb,
        }
    }
}

/// Inputs to [`resolve_display_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayModeInputs {
    pub requested: DisplayMode,
    pub force_sdr_on_hdr: bool,
    pub want_sdr_screenshot: bool,
    pub want_hdr_screenshot: bool,
    pub frame_generation: FrameGenerationTech,
    /// `VendorA` frame generation is being translated by the compatibility shim.
    pub frame_generation_shim: bool,
    /// Skip frame-generation coercion.
    pub enforce_user_mode: bool,
}

/// Resolve the effective display mode.
///
/// Precedence, highest first:
/// 1. SDR forced on HDR (setting, or an SDR-only screenshot pending) → `SdrOnWide`.
/// 2. The requested mode.
/// 3. Unless `enforce_user_mode`, frame generation may coerce the requested
///    mode: HDR10 → scRGB when the interpolator needs a half-float surface,
///    scRGB → HDR10 for `VendorA` without the shim.
pub fn resolve_display_mode(inputs: &DisplayModeInputs) -> EffectiveDisplayMode {
    if inputs.force_sdr_on_hdr || (inputs.want_sdr_screenshot && !inputs.want_hdr_screenshot) {
        return EffectiveDisplayMode::SdrOnWide;
    }

    let requested = inputs.requested;
    if inputs.enforce_user_mode {
        return requested.into();
    }

    let needs_wide = match inputs.frame_generation {
        FrameGenerationTech::VendorB => true,
        FrameGenerationTech::VendorA => inputs.frame_generation_shim,
        FrameGenerationTech::None => false,
    };

    match requested {
        DisplayMode::Hdr10Pq if needs_wide => EffectiveDisplayMode::ScRgb,
        DisplayMode::HdrScRgb
            if inputs.frame_generation == FrameGenerationTech::VendorA
                && !inputs.frame_generation_shim =>
        {
            EffectiveDisplayMode::Hdr10
        }
        _ => requested.into(),
    }
}
