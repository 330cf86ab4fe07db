// Display mode resolution and OS HDR state.

pub mod hdr_state;
pub mod mode;
pub mod types;
#[cfg(windows)]
pub mod windows;

pub use hdr_state::{apply_detected_peak_brightness, HdrState, PeakDetection};
pub use mode::{
    resolve_display_mode, DisplayMode, DisplayModeInputs, EffectiveDisplayMode, FrameGenerationTech,
};
pub use types::{AdvancedColorInfo, DisplayColorApi, HostEnvironment, MonitorInfo, OutputHandle};
