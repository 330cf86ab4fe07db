// Setting descriptors for the settings menu.
//
// Each user-facing setting is one row in `SETTINGS`: its store key, menu
// text, widget kind and accessors into `ColorSettings`. Values are carried
// as `i32`; checkboxes use 0/1 and enum steppers the option index.

use super::{keys, ColorSettings};
use crate::display::DisplayMode;

/// Widget kind of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Checkbox,
    EnumStepper { options: &'static [&'static str] },
    ValueStepper { min: i32, max: i32 },
    Slider { min: i32, max: i32, suffix: &'static str },
}

impl SettingKind {
    pub fn range(&self) -> (i32, i32) {
        match *self {
            SettingKind::Checkbox => (0, 1),
            SettingKind::EnumStepper { options } => (0, options.len() as i32 - 1),
            SettingKind::ValueStepper { min, max } | SettingKind::Slider { min, max, .. } => {
                (min, max)
            }
        }
    }

    pub fn accepts(&self, value: i32) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&value)
    }

    pub fn clamp(&self, value: i32) -> i32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

/// Static description of one setting.
#[derive(Debug)]
pub struct SettingDescriptor {
    /// Store key, also used as the menu id.
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: SettingKind,
    pub default: i32,
    read: fn(&ColorSettings) -> i32,
    write: fn(&mut ColorSettings, i32),
}

impl SettingDescriptor {
    pub fn read(&self, settings: &ColorSettings) -> i32 {
        (self.read)(settings)
    }

    /// Write `value` after clamping it into the setting's range.
    pub fn write(&self, settings: &mut ColorSettings, value: i32) {
        (self.write)(settings, self.kind.clamp(value))
    }

    /// Default value. Peak brightness resets to the detected baseline.
    pub fn default_for(&self, settings: &ColorSettings) -> i32 {
        if self.key == keys::PEAK_BRIGHTNESS {
            self.kind.clamp(settings.peak_brightness_baseline.round() as i32)
        } else {
            self.default
        }
    }

    pub fn reset(&self, settings: &mut ColorSettings) {
        let default = self.default_for(settings);
        self.write(settings, default);
    }

    pub fn view<'a>(&'static self, settings: &'a ColorSettings) -> Setting<'a> {
        Setting {
            descriptor: self,
            settings,
        }
    }
}

/// A setting bound to a settings record.
#[derive(Debug, Clone, Copy)]
pub struct Setting<'a> {
    pub descriptor: &'static SettingDescriptor,
    settings: &'a ColorSettings,
}

impl<'a> Setting<'a> {
    pub fn current_value(&self) -> i32 {
        self.descriptor.read(self.settings)
    }

    pub fn default_value(&self) -> i32 {
        self.descriptor.default_for(self.settings)
    }

    pub fn is_default(&self) -> bool {
        self.current_value() == self.default_value()
    }

    /// Text shown next to the widget.
    pub fn describe(&self) -> String {
        let value = self.current_value();
        match self.descriptor.kind {
            SettingKind::Checkbox => if value != 0 { "On" } else { "Off" }.to_string(),
            SettingKind::EnumStepper { options } => options
                .get(value as usize)
                .map(|s| s.to_string())
                .unwrap_or_else(|| value.to_string()),
            SettingKind::ValueStepper { .. } => value.to_string(),
            SettingKind::Slider { suffix, .. } => format!("{}{}", value, suffix),
        }
    }

    /// Position of the current value on a 0-100 slider track.
    pub fn slider_percentage(&self) -> f32 {
        let (min, max) = self.descriptor.kind.range();
        if max == min {
            return 0.0;
        }
        (self.current_value() - min) as f32 / (max - min) as f32 * 100.0
    }
}

/// Convert a 0-100 slider track position into a setting value.
pub fn value_from_slider(kind: &SettingKind, percentage: f32) -> i32 {
    let (min, max) = kind.range();
    let t = percentage.clamp(0.0, 100.0) / 100.0;
    (min as f32 + (max - min) as f32 * t).round() as i32
}

/// Look up a descriptor by id.
pub fn descriptor(id: &str) -> Option<&'static SettingDescriptor> {
    SETTINGS.iter().find(|d| d.key == id)
}

const PERCENT: SettingKind = SettingKind::Slider {
    min: 0,
    max: 100,
    suffix: "%",
};

const fn flag(value: bool) -> i32 {
    value as i32
}

/// Every user-facing setting, in menu order.
pub static SETTINGS: &[SettingDescriptor] = &[
    SettingDescriptor {
        key: keys::DISPLAY_MODE,
        name: "Display Mode",
        description: "Output color mode. HDR modes require an HDR capable display.",
        kind: SettingKind::EnumStepper {
            options: &["SDR", "HDR10 PQ", "HDR scRGB"],
        },
        default: 0,
        read: |s| s.display_mode.index(),
        write: |s, v| s.display_mode = DisplayMode::from_index(v).unwrap_or_default(),
    },
    SettingDescriptor {
        key: keys::FORCE_SDR_ON_HDR,
        name: "Force SDR on HDR",
        description: "Tone map to SDR while keeping the HDR output surface.",
        kind: SettingKind::Checkbox,
        default: flag(false),
        read: |s| flag(s.force_sdr_on_hdr),
        write: |s, v| s.force_sdr_on_hdr = v != 0,
    },
    SettingDescriptor {
        key: keys::ENFORCE_USER_DISPLAY_MODE,
        name: "Enforce Display Mode",
        description: "Keep the selected display mode even when frame generation prefers another.",
        kind: SettingKind::Checkbox,
        default: flag(false),
        read: |s| flag(s.enforce_user_display_mode),
        write: |s, v| s.enforce_user_display_mode = v != 0,
    },
    SettingDescriptor {
        key: keys::PEAK_BRIGHTNESS,
        name: "Peak Brightness",
        description: "Maximum brightness of the display in nits.",
        kind: SettingKind::Slider {
            min: 80,
            max: 10000,
            suffix: " nits",
        },
        default: super::DEFAULT_PEAK_BRIGHTNESS,
        read: |s| s.peak_brightness,
        write: |s, v| s.peak_brightness = v,
    },
    SettingDescriptor {
        key: keys::GAME_PAPER_WHITE,
        name: "Game Paper White",
        description: "Brightness of diffuse white in the game scene.",
        kind: SettingKind::Slider {
            min: 80,
            max: 500,
            suffix: " nits",
        },
        default: 200,
        read: |s| s.game_paper_white,
        write: |s, v| s.game_paper_white = v,
    },
    SettingDescriptor {
        key: keys::UI_PAPER_WHITE,
        name: "UI Paper White",
        description: "Brightness of the user interface.",
        kind: SettingKind::Slider {
            min: 80,
            max: 500,
            suffix: " nits",
        },
        default: 200,
        read: |s| s.ui_paper_white,
        write: |s, v| s.ui_paper_white = v,
    },
    SettingDescriptor {
        key: keys::EXTEND_GAMUT,
        name: "Extend Gamut",
        description: "Expand saturated colors beyond BT.709.",
        kind: PERCENT,
        default: 33,
        read: |s| s.extend_gamut,
        write: |s, v| s.extend_gamut = v,
    },
    SettingDescriptor {
        key: keys::SECONDARY_BRIGHTNESS,
        name: "Brightness",
        description: "SDR output brightness.",
        kind: PERCENT,
        default: 50,
        read: |s| s.secondary_brightness,
        write: |s, v| s.secondary_brightness = v,
    },
    SettingDescriptor {
        key: keys::TONE_MAPPER_TYPE,
        name: "Tonemapper",
        description: "Tone mapping operator.",
        kind: SettingKind::EnumStepper {
            options: &["Vanilla", "Vanilla+", "OpenDRT"],
        },
        default: 0,
        read: |s| s.tone_mapper_type,
        write: |s, v| s.tone_mapper_type = v,
    },
    SettingDescriptor {
        key: keys::SATURATION,
        name: "Saturation",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.saturation,
        write: |s, v| s.saturation = v,
    },
    SettingDescriptor {
        key: keys::CONTRAST,
        name: "Contrast",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.contrast,
        write: |s, v| s.contrast = v,
    },
    SettingDescriptor {
        key: keys::HIGHLIGHTS,
        name: "Highlights",
        description: "Highlight strength of the custom tone mapper.",
        kind: PERCENT,
        default: 50,
        read: |s| s.highlights,
        write: |s, v| s.highlights = v,
    },
    SettingDescriptor {
        key: keys::SHADOWS,
        name: "Shadows",
        description: "Shadow strength of the custom tone mapper.",
        kind: PERCENT,
        default: 50,
        read: |s| s.shadows,
        write: |s, v| s.shadows = v,
    },
    SettingDescriptor {
        key: keys::BLOOM,
        name: "Bloom",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.bloom,
        write: |s, v| s.bloom = v,
    },
    SettingDescriptor {
        key: keys::COLOR_GRADING_STRENGTH,
        name: "Color Grading",
        description: "Strength of the game's color grading.",
        kind: PERCENT,
        default: 100,
        read: |s| s.color_grading_strength,
        write: |s, v| s.color_grading_strength = v,
    },
    SettingDescriptor {
        key: keys::LUT_CORRECTION_STRENGTH,
        name: "LUT Correction",
        description: "Remove the raised black floor of the game's LUTs.",
        kind: PERCENT,
        default: 100,
        read: |s| s.lut_correction_strength,
        write: |s, v| s.lut_correction_strength = v,
    },
    SettingDescriptor {
        key: keys::VANILLA_MENU_LUTS,
        name: "Vanilla Menu LUTs",
        description: "Use unmodified LUTs in menus.",
        kind: SettingKind::Checkbox,
        default: flag(true),
        read: |s| flag(s.vanilla_menu_luts),
        write: |s, v| s.vanilla_menu_luts = v != 0,
    },
    SettingDescriptor {
        key: keys::STRICT_LUT_APPLICATION,
        name: "Strict LUT Application",
        description: "Apply LUTs only within their original range.",
        kind: SettingKind::Checkbox,
        default: flag(false),
        read: |s| flag(s.strict_lut_application),
        write: |s, v| s.strict_lut_application = v != 0,
    },
    SettingDescriptor {
        key: keys::GAMMA_CORRECTION_STRENGTH,
        name: "Gamma Correction",
        description: "Blend between sRGB and 2.2 gamma.",
        kind: PERCENT,
        default: 50,
        read: |s| s.gamma_correction_strength,
        write: |s, v| s.gamma_correction_strength = v,
    },
    SettingDescriptor {
        key: keys::FILM_GRAIN_TYPE,
        name: "Film Grain",
        description: "",
        kind: SettingKind::EnumStepper {
            options: &["Vanilla", "Improved"],
        },
        default: 1,
        read: |s| s.film_grain_type,
        write: |s, v| s.film_grain_type = v,
    },
    SettingDescriptor {
        key: keys::FILM_GRAIN_FPS_LIMIT,
        name: "Film Grain FPS Limit",
        description: "Update rate of the film grain pattern. 0 updates every frame.",
        kind: SettingKind::ValueStepper { min: 0, max: 240 },
        default: 0,
        read: |s| s.film_grain_fps_limit,
        write: |s, v| s.film_grain_fps_limit = v,
    },
    SettingDescriptor {
        key: keys::POST_SHARPEN,
        name: "Post Sharpen",
        description: "",
        kind: SettingKind::Checkbox,
        default: flag(true),
        read: |s| flag(s.post_sharpen),
        write: |s, v| s.post_sharpen = v != 0,
    },
    SettingDescriptor {
        key: keys::HDR_SCREENSHOTS,
        name: "HDR Screenshots",
        description: "Save an additional HDR image when taking photo mode screenshots.",
        kind: SettingKind::Checkbox,
        default: flag(true),
        read: |s| flag(s.hdr_screenshots),
        write: |s, v| s.hdr_screenshots = v != 0,
    },
    SettingDescriptor {
        key: keys::HDR_SCREENSHOTS_LOSSLESS,
        name: "Lossless HDR Screenshots",
        description: "Compress HDR screenshots without loss.",
        kind: SettingKind::Checkbox,
        default: flag(false),
        read: |s| flag(s.hdr_screenshots_lossless),
        write: |s, v| s.hdr_screenshots_lossless = v != 0,
    },
    SettingDescriptor {
        key: keys::DEV_SETTINGS[0],
        name: "Dev Setting 1",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.dev_settings[0],
        write: |s, v| s.dev_settings[0] = v,
    },
    SettingDescriptor {
        key: keys::DEV_SETTINGS[1],
        name: "Dev Setting 2",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.dev_settings[1],
        write: |s, v| s.dev_settings[1] = v,
    },
    SettingDescriptor {
        key: keys::DEV_SETTINGS[2],
        name: "Dev Setting 3",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.dev_settings[2],
        write: |s, v| s.dev_settings[2] = v,
    },
    SettingDescriptor {
        key: keys::DEV_SETTINGS[3],
        name: "Dev Setting 4",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.dev_settings[3],
        write: |s, v| s.dev_settings[3] = v,
    },
    SettingDescriptor {
        key: keys::DEV_SETTINGS[4],
        name: "Dev Setting 5",
        description: "",
        kind: PERCENT,
        default: 50,
        read: |s| s.dev_settings[4],
        write: |s, v| s.dev_settings[4] = v,
    },
];
