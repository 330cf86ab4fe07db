// Constant buffer shared with the tone-mapping shaders.
//
// `ShaderConstants` is uploaded as-is; field order and widths must match the
// HLSL constant buffer declaration. Building one is a pure function of the
// published settings and per-frame flags and does not allocate.

use bytemuck::{Pod, Zeroable};

use crate::color::transfer::PQ_MAX_NITS;
use crate::display::{resolve_display_mode, DisplayModeInputs, FrameGenerationTech};
use crate::settings::ColorSettings;

/// Constant buffer layout, 26 x 4 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShaderConstants {
    /// Effective display mode index, -1 to 2.
    pub display_mode: i32,
    pub peak_brightness: f32,
    pub game_paper_white: f32,
    pub ui_paper_white: f32,
    pub extend_gamut: f32,
    pub sdr_secondary_brightness: f32,
    pub tone_mapper_type: u32,
    pub saturation: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub bloom: f32,
    pub color_grading_strength: f32,
    pub lut_correction_strength: f32,
    pub strict_lut_application: u32,
    pub gamma_correction_strength: f32,
    pub film_grain_type: u32,
    pub film_grain_fps_limit: f32,
    pub post_sharpen: u32,
    pub is_at_end_of_frame: u32,
    pub runtime_ms: f32,
    pub dev_settings: [f32; 5],
}

/// Frame-scoped inputs to [`build_shader_constants`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    pub is_at_end_of_frame: bool,
    pub want_sdr_screenshot: bool,
    pub want_hdr_screenshot: bool,
    pub frame_generation: FrameGenerationTech,
    pub frame_generation_shim: bool,
    /// Milliseconds since the controller started.
    pub runtime_ms: f32,
}

impl FrameState {
    /// An SDR capture is pending and no HDR one is.
    pub fn sdr_only_screenshot(&self) -> bool {
        self.want_sdr_screenshot && !self.want_hdr_screenshot
    }
}

#[inline]
fn percent(value: i32) -> f32 {
    value as f32 * 0.01
}

/// 0-100 → 0.5-1.5
#[inline]
fn centered(value: i32) -> f32 {
    0.5 + percent(value)
}

/// Derive the constant buffer for one consumer.
pub fn build_shader_constants(settings: &ColorSettings, frame: &FrameState) -> ShaderConstants {
    let display_mode = resolve_display_mode(&DisplayModeInputs {
        requested: settings.display_mode,
        force_sdr_on_hdr: settings.force_sdr_on_hdr,
        want_sdr_screenshot: frame.want_sdr_screenshot,
        want_hdr_screenshot: frame.want_hdr_screenshot,
        frame_generation: frame.frame_generation,
        frame_generation_shim: frame.frame_generation_shim,
        enforce_user_mode: settings.enforce_user_display_mode,
    });

    let sdr_only = frame.sdr_only_screenshot();
    let custom_tone_mapper = settings.is_custom_tone_mapper();
    let tone_mapper_slider = |value: i32| {
        if custom_tone_mapper {
            percent(value)
        } else {
            0.5
        }
    };

    ShaderConstants {
        display_mode: display_mode.index(),
        peak_brightness: if frame.want_hdr_screenshot {
            PQ_MAX_NITS
        } else {
            settings.peak_brightness as f32
        },
        game_paper_white: settings.game_paper_white as f32,
        ui_paper_white: settings.ui_paper_white as f32,
        extend_gamut: percent(settings.extend_gamut),
        sdr_secondary_brightness: if settings.is_game_rendering_hdr(sdr_only) {
            1.0
        } else {
            settings.secondary_brightness as f32 * 0.02
        },
        tone_mapper_type: settings.tone_mapper_type.max(0) as u32,
        saturation: centered(settings.saturation),
        contrast: centered(settings.contrast),
        highlights: tone_mapper_slider(settings.highlights),
        shadows: tone_mapper_slider(settings.shadows),
        bloom: percent(settings.bloom),
        color_grading_strength: percent(settings.color_grading_strength),
        lut_correction_strength: percent(settings.lut_correction_strength),
        strict_lut_application: settings.strict_lut_application as u32,
        gamma_correction_strength: percent(settings.gamma_correction_strength),
        film_grain_type: settings.film_grain_type.max(0) as u32,
        film_grain_fps_limit: settings.film_grain_fps_limit as f32,
        post_sharpen: settings.post_sharpen as u32,
        is_at_end_of_frame: frame.is_at_end_of_frame as u32,
        runtime_ms: frame.runtime_ms,
        dev_settings: settings.dev_settings.map(percent),
    }
}

impl ShaderConstants {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayMode;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_layout() {
        assert_eq!(std::mem::size_of::<ShaderConstants>(), 104);
        assert_eq!(std::mem::align_of::<ShaderConstants>(), 4);

        let constants = build_shader_constants(&ColorSettings::default(), &FrameState::default());
        let bytes = constants.as_bytes();
        // IsAtEndOfFrame is the 20th field, RuntimeMS the 21st.
        assert_eq!(&bytes[76..80], &0u32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &1000f32.to_ne_bytes());
    }

    #[test]
    fn test_saturation_remap() {
        let mut settings = ColorSettings::default();
        let frame = FrameState::default();
        for (value, expected) in [(0, 0.5), (50, 1.0), (100, 1.5)] {
            settings.saturation = value;
            settings.contrast = value;
            let constants = build_shader_constants(&settings, &frame);
            assert!(approx(constants.saturation, expected), "saturation {}", value);
            assert!(approx(constants.contrast, expected), "contrast {}", value);
        }
    }

    #[test]
    fn test_hdr_screenshot_peak_override() {
        let mut settings = ColorSettings::default();
        settings.display_mode = DisplayMode::HdrScRgb;
        settings.peak_brightness = 650;

        let idle = build_shader_constants(&settings, &FrameState::default());
        assert_eq!(idle.peak_brightness, 650.0);

        let frame = FrameState {
            want_hdr_screenshot: true,
            ..Default::default()
        };
        let capture = build_shader_constants(&settings, &frame);
        assert_eq!(capture.peak_brightness, 10000.0);
    }

    #[test]
    fn test_secondary_brightness() {
        let mut settings = ColorSettings::default();
        settings.secondary_brightness = 75;
        let sdr = build_shader_constants(&settings, &FrameState::default());
        assert!(approx(sdr.sdr_secondary_brightness, 1.5));

        settings.display_mode = DisplayMode::Hdr10Pq;
        let hdr = build_shader_constants(&settings, &FrameState::default());
        assert_eq!(hdr.sdr_secondary_brightness, 1.0);

        // SDR screenshot forces SDR tone output for the capture frame.
        let frame = FrameState {
            want_sdr_screenshot: true,
            ..Default::default()
        };
        let shot = build_shader_constants(&settings, &frame);
        assert!(approx(shot.sdr_secondary_brightness, 1.5));
        assert_eq!(shot.display_mode, -1);
    }

    #[test]
    fn test_tone_mapper_sliders() {
        let mut settings = ColorSettings::default();
        settings.highlights = 80;
        settings.shadows = 10;

        let vanilla = build_shader_constants(&settings, &FrameState::default());
        assert_eq!(vanilla.highlights, 0.5);
        assert_eq!(vanilla.shadows, 0.5);

        settings.tone_mapper_type = 2;
        let custom = build_shader_constants(&settings, &FrameState::default());
        assert!(approx(custom.highlights, 0.8));
        assert!(approx(custom.shadows, 0.1));
        assert_eq!(custom.tone_mapper_type, 2);
    }

    #[test]
    fn test_display_mode_field() {
        let mut settings = ColorSettings::default();
        settings.display_mode = DisplayMode::Hdr10Pq;
        let frame = FrameState {
            frame_generation: FrameGenerationTech::VendorB,
            is_at_end_of_frame: true,
            runtime_ms: 16.5,
            ..Default::default()
        };
        let constants = build_shader_constants(&settings, &frame);
        assert_eq!(constants.display_mode, 2);
        assert_eq!(constants.is_at_end_of_frame, 1);
        assert_eq!(constants.runtime_ms, 16.5);
    }

    #[test]
    fn test_percent_fields() {
        let settings = ColorSettings::default();
        let constants = build_shader_constants(&settings, &FrameState::default());
        assert!(approx(constants.extend_gamut, 0.33));
        assert!(approx(constants.color_grading_strength, 1.0));
        assert!(approx(constants.gamma_correction_strength, 0.5));
        assert_eq!(constants.film_grain_type, 1);
        assert_eq!(constants.post_sharpen, 1);
        assert!(constants.dev_settings.iter().all(|&v| approx(v, 0.5)));
    }
}
