//! Persisted color settings.
//!
//! [`ColorSettings`] is the authoritative record, owned by the controller and
//! mutated only from settings callbacks. It is bound key by key to a
//! [`SettingsStore`]; the hot path reads a published copy from
//! [`LiveSettings`].

pub mod live;
pub mod model;
pub mod store;
pub mod ui;

use log::warn;

use crate::display::DisplayMode;

pub use live::LiveSettings;
pub use model::{descriptor, value_from_slider, Setting, SettingDescriptor, SettingKind, SETTINGS};
pub use store::{SettingsStore, StoredValue};
pub use ui::{is_setting_enabled, sync_settings_ui, SettingsUi};

/// Store keys.
pub mod keys {
    pub const DISPLAY_MODE: &str = "DisplayMode";
    pub const FORCE_SDR_ON_HDR: &str = "ForceSDROnHDR";
    pub const ENFORCE_USER_DISPLAY_MODE: &str = "EnforceUserDisplayMode";
    pub const PEAK_BRIGHTNESS: &str = "PeakBrightness";
    pub const PEAK_BRIGHTNESS_AUTO_DETECTED: &str = "PeakBrightnessAutoDetected";
    pub const GAME_PAPER_WHITE: &str = "GamePaperWhite";
    pub const UI_PAPER_WHITE: &str = "UIPaperWhite";
    pub const EXTEND_GAMUT: &str = "ExtendGamut";
    pub const SECONDARY_BRIGHTNESS: &str = "SecondaryBrightness";
    pub const TONE_MAPPER_TYPE: &str = "ToneMapperType";
    pub const SATURATION: &str = "Saturation";
    pub const CONTRAST: &str = "Contrast";
    pub const HIGHLIGHTS: &str = "Highlights";
    pub const SHADOWS: &str = "Shadows";
    pub const BLOOM: &str = "Bloom";
    pub const COLOR_GRADING_STRENGTH: &str = "ColorGradingStrength";
    pub const LUT_CORRECTION_STRENGTH: &str = "LUTCorrectionStrength";
    pub const VANILLA_MENU_LUTS: &str = "VanillaMenuLUTs";
    pub const STRICT_LUT_APPLICATION: &str = "StrictLUTApplication";
    pub const GAMMA_CORRECTION_STRENGTH: &str = "GammaCorrectionStrength";
    pub const FILM_GRAIN_TYPE: &str = "FilmGrainType";
    pub const FILM_GRAIN_FPS_LIMIT: &str = "FilmGrainFPSLimit";
    pub const POST_SHARPEN: &str = "PostSharpen";
    pub const HDR_SCREENSHOTS: &str = "HDRScreenshots";
    pub const HDR_SCREENSHOTS_LOSSLESS: &str = "HDRScreenshotsLossless";
    pub const DEV_SETTINGS: [&str; 5] = [
        "DevSetting01",
        "DevSetting02",
        "DevSetting03",
        "DevSetting04",
        "DevSetting05",
    ];
}

/// Default peak brightness in nits until the display reports one.
pub const DEFAULT_PEAK_BRIGHTNESS: i32 = 1000;

/// User color settings.
///
/// Percentage sliders are stored as 0-100 integers and brightness values as
/// whole nits; the shader builder does all remapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSettings {
    pub display_mode: DisplayMode,
    pub force_sdr_on_hdr: bool,
    pub enforce_user_display_mode: bool,
    pub peak_brightness: i32,
    pub peak_brightness_auto_detected: bool,
    /// Reset target for `peak_brightness`. Follows the last detection and is
    /// not persisted.
    pub peak_brightness_baseline: f32,
    pub game_paper_white: i32,
    pub ui_paper_white: i32,
    pub extend_gamut: i32,
    pub secondary_brightness: i32,
    pub tone_mapper_type: i32,
    pub saturation: i32,
    pub contrast: i32,
    pub highlights: i32,
    pub shadows: i32,
    pub bloom: i32,
    pub color_grading_strength: i32,
    pub lut_correction_strength: i32,
    pub vanilla_menu_luts: bool,
    pub strict_lut_application: bool,
    pub gamma_correction_strength: i32,
    pub film_grain_type: i32,
    pub film_grain_fps_limit: i32,
    pub post_sharpen: bool,
    pub hdr_screenshots: bool,
    pub hdr_screenshots_lossless: bool,
    pub dev_settings: [i32; 5],
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::Sdr,
            force_sdr_on_hdr: false,
            enforce_user_display_mode: false,
            peak_brightness: DEFAULT_PEAK_BRIGHTNESS,
            peak_brightness_auto_detected: false,
            peak_brightness_baseline: DEFAULT_PEAK_BRIGHTNESS as f32,
            game_paper_white: 200,
            ui_paper_white: 200,
            extend_gamut: 33,
            secondary_brightness: 50,
            tone_mapper_type: 0,
            saturation: 50,
            contrast: 50,
            highlights: 50,
            shadows: 50,
            bloom: 50,
            color_grading_strength: 100,
            lut_correction_strength: 100,
            vanilla_menu_luts: true,
            strict_lut_application: false,
            gamma_correction_strength: 50,
            film_grain_type: 1,
            film_grain_fps_limit: 0,
            post_sharpen: true,
            hdr_screenshots: true,
            hdr_screenshots_lossless: false,
            dev_settings: [50; 5],
        }
    }
}

impl ColorSettings {
    /// Read every bound key from `store`.
    ///
    /// Missing keys, wrongly typed values and out-of-range values fall back
    /// to their defaults.
    pub fn load_from(store: &SettingsStore) -> Self {
        let mut settings = Self::default();
        for desc in SETTINGS {
            let Some(value) = store.get(desc.key) else {
                continue;
            };
            let parsed = match desc.kind {
                SettingKind::Checkbox => value.as_bool().map(i32::from),
                _ => value.as_int(),
            };
            match parsed {
                Some(v) if desc.kind.accepts(v) => desc.write(&mut settings, v),
                _ => warn!("Ignoring invalid value {:?} for setting {}", value, desc.key),
            }
        }
        settings.peak_brightness_auto_detected = store
            .get_bool(keys::PEAK_BRIGHTNESS_AUTO_DETECTED)
            .unwrap_or(false);
        settings
    }

    /// Write every bound key into `store`. Does not save the store.
    pub fn store_into(&self, store: &mut SettingsStore) {
        for desc in SETTINGS {
            let value = desc.read(self);
            match desc.kind {
                SettingKind::Checkbox => store.set(desc.key, value != 0),
                _ => store.set(desc.key, value),
            }
        }
        store.set(
            keys::PEAK_BRIGHTNESS_AUTO_DETECTED,
            self.peak_brightness_auto_detected,
        );
    }

    /// SDR tone output while presenting through a wide surface.
    ///
    /// `sdr_only_screenshot` is true when an SDR capture is pending without
    /// an HDR one and the caller acknowledges screenshot requests.
    pub fn is_sdr_forced_on_hdr(&self, sdr_only_screenshot: bool) -> bool {
        self.force_sdr_on_hdr || sdr_only_screenshot
    }

    pub fn is_display_mode_hdr(&self) -> bool {
        self.display_mode.is_hdr()
    }

    pub fn is_game_rendering_hdr(&self, sdr_only_screenshot: bool) -> bool {
        self.is_display_mode_hdr() && !self.is_sdr_forced_on_hdr(sdr_only_screenshot)
    }

    pub fn is_custom_tone_mapper(&self) -> bool {
        self.is_display_mode_hdr() || self.tone_mapper_type > 0
    }

    pub fn is_film_grain_improved(&self) -> bool {
        self.film_grain_type == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_store() {
        let store = SettingsStore::in_memory();
        let settings = ColorSettings::load_from(&store);
        assert_eq!(settings, ColorSettings::default());
        assert_eq!(settings.peak_brightness, 1000);
        assert_eq!(settings.extend_gamut, 33);
        assert!(settings.post_sharpen);
    }

    #[test]
    fn test_store_round_trip() {
        let mut settings = ColorSettings::default();
        settings.display_mode = DisplayMode::HdrScRgb;
        settings.force_sdr_on_hdr = true;
        settings.peak_brightness = 750;
        settings.peak_brightness_auto_detected = true;
        settings.saturation = 70;
        settings.dev_settings[3] = 12;

        let mut store = SettingsStore::in_memory();
        settings.store_into(&mut store);
        assert_eq!(store.get_int(keys::DISPLAY_MODE), Some(2));
        assert_eq!(store.get_bool(keys::FORCE_SDR_ON_HDR), Some(true));

        let loaded = ColorSettings::load_from(&store);
        assert_eq!(loaded.display_mode, DisplayMode::HdrScRgb);
        assert!(loaded.force_sdr_on_hdr);
        assert_eq!(loaded.peak_brightness, 750);
        assert!(loaded.peak_brightness_auto_detected);
        assert_eq!(loaded.saturation, 70);
        assert_eq!(loaded.dev_settings, [50, 50, 50, 12, 50]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let mut store = SettingsStore::in_memory();
        store.set(keys::DISPLAY_MODE, 7);
        store.set(keys::SATURATION, "lots");
        store.set(keys::CONTRAST, 250);
        store.set(keys::BLOOM, 20);

        let settings = ColorSettings::load_from(&store);
        assert_eq!(settings.display_mode, DisplayMode::Sdr);
        assert_eq!(settings.saturation, 50);
        assert_eq!(settings.contrast, 50);
        assert_eq!(settings.bloom, 20);
    }

    #[test]
    fn test_predicates() {
        let mut settings = ColorSettings::default();
        assert!(!settings.is_display_mode_hdr());
        assert!(!settings.is_custom_tone_mapper());
        assert!(settings.is_film_grain_improved());

        settings.display_mode = DisplayMode::Hdr10Pq;
        assert!(settings.is_game_rendering_hdr(false));
        assert!(!settings.is_game_rendering_hdr(true));
        assert!(settings.is_custom_tone_mapper());

        settings.force_sdr_on_hdr = true;
        assert!(settings.is_sdr_forced_on_hdr(false));
        assert!(!settings.is_game_rendering_hdr(false));

        settings.display_mode = DisplayMode::Sdr;
        settings.tone_mapper_type = 1;
        assert!(settings.is_custom_tone_mapper());
    }
}
