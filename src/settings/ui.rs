// Push settings into the host's settings menu.

use log::debug;

use super::{keys, ColorSettings, SettingKind, StoredValue, SETTINGS};

/// Host settings-menu data model.
pub trait SettingsUi {
    /// Whether the menu has an entry with this id.
    fn find_setting(&self, id: &str) -> bool;

    fn set_enabled(&mut self, id: &str, enabled: bool);

    fn set_value(&mut self, id: &str, value: StoredValue);
}

/// Whether a setting is editable given the current state.
pub fn is_setting_enabled(key: &str, settings: &ColorSettings, hdr_supported: bool) -> bool {
    let rendering_hdr = settings.is_game_rendering_hdr(false);
    match key {
        keys::DISPLAY_MODE => hdr_supported,
        keys::GAME_PAPER_WHITE => rendering_hdr || settings.is_sdr_forced_on_hdr(false),
        keys::PEAK_BRIGHTNESS
        | keys::UI_PAPER_WHITE
        | keys::EXTEND_GAMUT
        | keys::STRICT_LUT_APPLICATION => rendering_hdr,
        keys::SECONDARY_BRIGHTNESS => !rendering_hdr,
        keys::HIGHLIGHTS | keys::SHADOWS => settings.is_custom_tone_mapper(),
        keys::FILM_GRAIN_FPS_LIMIT => settings.is_film_grain_improved(),
        keys::HDR_SCREENSHOTS_LOSSLESS => settings.hdr_screenshots,
        _ => true,
    }
}

/// Push every setting value and its enabled state to the menu.
///
/// Ids the menu does not know are skipped.
pub fn sync_settings_ui(ui: &mut dyn SettingsUi, settings: &ColorSettings, hdr_supported: bool) {
    let mut pushed = 0usize;
    for desc in SETTINGS {
        if !ui.find_setting(desc.key) {
            continue;
        }
        let value = desc.read(settings);
        let value = match desc.kind {
            SettingKind::Checkbox => StoredValue::Bool(value != 0),
            _ => StoredValue::from(value),
        };
        ui.set_value(desc.key, value);
        ui.set_enabled(desc.key, is_setting_enabled(desc.key, settings, hdr_supported));
        pushed += 1;
    }
    debug!("Synced {} settings to the menu", pushed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayMode;
    use crate::mock::MockSettingsUi;

    #[test]
    fn test_sdr_rules() {
        let settings = ColorSettings::default();
        assert!(!is_setting_enabled(keys::DISPLAY_MODE, &settings, false));
        assert!(is_setting_enabled(keys::DISPLAY_MODE, &settings, true));
        assert!(!is_setting_enabled(keys::PEAK_BRIGHTNESS, &settings, true));
        assert!(!is_setting_enabled(keys::GAME_PAPER_WHITE, &settings, true));
        assert!(is_setting_enabled(keys::SECONDARY_BRIGHTNESS, &settings, true));
        assert!(!is_setting_enabled(keys::HIGHLIGHTS, &settings, true));
        assert!(is_setting_enabled(keys::FILM_GRAIN_FPS_LIMIT, &settings, true));
        assert!(is_setting_enabled(keys::HDR_SCREENSHOTS_LOSSLESS, &settings, true));
    }

    #[test]
    fn test_hdr_rules() {
        let mut settings = ColorSettings::default();
        settings.display_mode = DisplayMode::Hdr10Pq;
        assert!(is_setting_enabled(keys::PEAK_BRIGHTNESS, &settings, true));
        assert!(is_setting_enabled(keys::UI_PAPER_WHITE, &settings, true));
        assert!(is_setting_enabled(keys::STRICT_LUT_APPLICATION, &settings, true));
        assert!(!is_setting_enabled(keys::SECONDARY_BRIGHTNESS, &settings, true));
        assert!(is_setting_enabled(keys::SHADOWS, &settings, true));

        settings.force_sdr_on_hdr = true;
        assert!(!is_setting_enabled(keys::PEAK_BRIGHTNESS, &settings, true));
        assert!(is_setting_enabled(keys::GAME_PAPER_WHITE, &settings, true));
        assert!(is_setting_enabled(keys::SECONDARY_BRIGHTNESS, &settings, true));
    }

    #[test]
    fn test_sync_pushes_known_ids() {
        let mut settings = ColorSettings::default();
        settings.hdr_screenshots = false;
        let mut ui = MockSettingsUi::with_ids(&[keys::DISPLAY_MODE, keys::HDR_SCREENSHOTS_LOSSLESS]);

        sync_settings_ui(&mut ui, &settings, false);

        assert_eq!(ui.value(keys::DISPLAY_MODE), Some(StoredValue::Int(0)));
        assert_eq!(ui.enabled(keys::DISPLAY_MODE), Some(false));
        assert_eq!(
            ui.value(keys::HDR_SCREENSHOTS_LOSSLESS),
            Some(StoredValue::Bool(false))
        );
        assert_eq!(ui.enabled(keys::HDR_SCREENSHOTS_LOSSLESS), Some(false));
        assert_eq!(ui.value(keys::SATURATION), None);
    }
}
