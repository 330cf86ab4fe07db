// Display-side collaborator types.

use crate::error::Result;

/// Opaque handle of the window that owns the output surface.
///
/// Stored as `isize` so it can cross threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OutputHandle(pub isize);

/// Advanced color (HDR) state of the monitor that contains an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvancedColorInfo {
    pub supported: bool,
    pub enabled: bool,
    pub force_disabled: bool,
    pub bits_per_color_channel: u32,
}

impl AdvancedColorInfo {
    /// Decode the `DISPLAYCONFIG_GET_ADVANCED_COLOR_INFO` bitfield.
    ///
    /// - bit 0: advancedColorSupported
    /// - bit 1: advancedColorEnabled
    /// - bit 3: advancedColorForceDisabled
    pub fn from_bits(value: u32, bits_per_color_channel: u32) -> Self {
        Self {
            supported: value & 1 != 0,
            enabled: (value >> 1) & 1 != 0,
            force_disabled: (value >> 3) & 1 != 0,
            bits_per_color_channel,
        }
    }
}

/// Monitor information
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInfo {
    /// GDI device name (e.g. "\\\\.\\DISPLAY1")
    pub name: String,
    pub is_primary: bool,
    pub width: u32,
    pub height: u32,
    pub color: AdvancedColorInfo,
    /// Peak luminance reported by the output, if known.
    pub max_luminance: Option<f32>,
}

/// OS color-management API.
///
/// Every query resolves the monitor that currently contains `output`, so a
/// window moved to another monitor is picked up by the next call.
pub trait DisplayColorApi: Send + Sync {
    /// Read advanced-color support/enabled state.
    fn advanced_color_info(&self, output: OutputHandle) -> Result<AdvancedColorInfo>;

    /// Enable or disable advanced color on the monitor. Single attempt.
    fn set_advanced_color_enabled(&self, output: OutputHandle, enabled: bool) -> Result<()>;

    /// Peak luminance in nits as reported by the output.
    fn max_luminance(&self, output: OutputHandle) -> Result<f32>;

    /// All active monitors with their color state.
    fn enumerate_monitors(&self) -> Result<Vec<MonitorInfo>>;
}

/// Host process probe.
pub trait HostEnvironment: Send + Sync {
    /// Whether a module with this file name is loaded in the process.
    fn is_module_loaded(&self, name: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advanced_color_bits() {
        let info = AdvancedColorInfo::from_bits(0b0011, 10);
        assert!(info.supported);
        assert!(info.enabled);
        assert!(!info.force_disabled);

        let info = AdvancedColorInfo::from_bits(0b1001, 8);
        assert!(info.supported);
        assert!(!info.enabled);
        assert!(info.force_disabled);
        assert_eq!(info.bits_per_color_channel, 8);

        // wideColorEnforced is not tracked
        assert_eq!(AdvancedColorInfo::from_bits(0b0100, 8), AdvancedColorInfo::from_bits(0, 8));
    }
}
