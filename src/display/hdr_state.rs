// HDR capability/enablement tracking for the active output.
//
// State is cached in atomics so the per-draw paths can read it without
// locking. Refreshes are idempotent and only run on the designated thread.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use super::types::{DisplayColorApi, OutputHandle};
use crate::settings::{descriptor, keys, ColorSettings};

/// Lowest peak brightness accepted from auto-detection.
pub const MIN_DETECTED_PEAK_NITS: f32 = 80.0;

/// Cached advanced-color state of the monitor showing the output surface.
#[derive(Debug, Default)]
pub struct HdrState {
    supported: AtomicBool,
    enabled: AtomicBool,
    /// At least one query succeeded.
    known: AtomicBool,
}

impl HdrState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_supported(&self) -> bool {
        self.supported.load(Ordering::Acquire)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Re-poll support and enabled state.
    ///
    /// On failure the previously cached state is kept; before the first
    /// successful query that means "unsupported".
    pub fn refresh_support_state(&self, api: &dyn DisplayColorApi, output: OutputHandle) -> bool {
        match api.advanced_color_info(output) {
            Ok(color) => {
                let supported = color.supported && !color.force_disabled;
                self.supported.store(supported, Ordering::Release);
                self.enabled.store(supported && color.enabled, Ordering::Release);
                self.known.store(true, Ordering::Release);
                debug!(
                    "HDR state refreshed: supported={}, enabled={}",
                    supported, color.enabled
                );
                true
            }
            Err(e) => {
                warn!("HDR state query failed, keeping cached state: {}", e);
                if !self.known.load(Ordering::Acquire) {
                    self.supported.store(false, Ordering::Release);
                    self.enabled.store(false, Ordering::Release);
                }
                false
            }
        }
    }

    /// Turn OS HDR on when it is supported, off, and the game wants HDR.
    ///
    /// One attempt per call; a failed attempt is not retried.
    pub fn refresh_enable_state(
        &self,
        api: &dyn DisplayColorApi,
        output: OutputHandle,
        wants_hdr: bool,
    ) -> bool {
        if !(self.is_supported() && !self.is_enabled() && wants_hdr) {
            return self.is_enabled();
        }

        match api.set_advanced_color_enabled(output, true) {
            Ok(()) => {
                info!("Enabled OS HDR on the output monitor");
                self.enabled.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                warn!("Failed to enable OS HDR: {}", e);
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_for_test(&self, supported: bool, enabled: bool) {
        self.supported.store(supported, Ordering::Release);
        self.enabled.store(enabled, Ordering::Release);
        self.known.store(true, Ordering::Release);
    }
}

/// Outcome of feeding a detected peak luminance into the settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeakDetection {
    /// First detection: the active value was set and must be persisted.
    Applied(f32),
    /// Already auto-detected earlier: only the default baseline moved.
    BaselineOnly(f32),
}

/// Apply a detected peak luminance.
///
/// The reset baseline always follows the detection; the active value is
/// written only the first time, guarded by the persisted auto-detected flag.
pub fn apply_detected_peak_brightness(settings: &mut ColorSettings, detected: f32) -> PeakDetection {
    settings.peak_brightness_baseline = detected;
    if settings.peak_brightness_auto_detected {
        return PeakDetection::BaselineOnly(detected);
    }

    settings.peak_brightness_auto_detected = true;
    let nits = detected.max(MIN_DETECTED_PEAK_NITS).round() as i32;
    settings.peak_brightness = descriptor(keys::PEAK_BRIGHTNESS).map_or(nits, |d| d.kind.clamp(nits));
    PeakDetection::Applied(detected)
}
