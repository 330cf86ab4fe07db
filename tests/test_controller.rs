// Integration test: display mode resolution, HDR state and settings via ColorController

use std::path::PathBuf;
use std::sync::Arc;

use hdrcontrol::mock::{
    MockDisplay, MockHost, MockRenderBackend, MockSettingsUi, RecordingSurface, SurfaceCall,
};
use hdrcontrol::settings::keys;
use hdrcontrol::{
    BufferFormat, ColorController, ColorSpace, DisplayMode, EffectiveDisplayMode,
    FrameGenerationTech, OutputHandle, ScreenshotConfig, SettingsStore, StoredValue,
};

struct Harness {
    controller: ColorController,
    display: Arc<MockDisplay>,
    surface: RecordingSurface,
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn harness_with(store: SettingsStore, display: MockDisplay, modules: &[&str]) -> Harness {
    init_logger();
    let display = Arc::new(display);
    let surface = RecordingSurface::new();
    let controller = ColorController::new(
        store,
        display.clone(),
        Arc::new(MockHost::with_modules(modules)),
        Box::new(surface.clone()),
        Arc::new(MockRenderBackend::new(8, 8)),
        ScreenshotConfig::default(),
    );
    controller
        .init_compatibility(OutputHandle(1))
        .expect("init_compatibility failed");
    Harness {
        controller,
        display,
        surface,
    }
}

fn hdr_harness() -> Harness {
    harness_with(
        SettingsStore::in_memory(),
        MockDisplay::hdr_enabled(1000.0),
        &["SFShaderInjector.dll"],
    )
}

fn set_mode(controller: &ColorController, mode: i32) {
    controller
        .set_setting(keys::DISPLAY_MODE, StoredValue::Int(mode as i64))
        .expect("set DisplayMode");
}

fn temp_store(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hdrcontrol-it-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("settings.json")
}

#[test]
fn test_requested_mode_passes_through() {
    let h = hdr_harness();
    for mode in 0..3 {
        set_mode(&h.controller, mode);
        assert_eq!(
            h.controller.get_effective_display_mode().index(),
            mode,
            "mode {}",
            mode
        );
    }
}

#[test]
fn test_force_sdr_on_hdr() {
    let h = hdr_harness();
    h.controller
        .set_setting(keys::FORCE_SDR_ON_HDR, StoredValue::Bool(true))
        .unwrap();
    for mode in 0..3 {
        set_mode(&h.controller, mode);
        assert_eq!(
            h.controller.get_effective_display_mode(),
            EffectiveDisplayMode::SdrOnWide
        );
        assert_eq!(h.controller.get_buffer_format(), BufferFormat::R16G16B16A16Float);
        assert_eq!(h.controller.get_color_space(), ColorSpace::RgbFullG10P709);
    }
}

#[test]
fn test_frame_generation_coercion() {
    let h = hdr_harness();

    set_mode(&h.controller, 1);
    h.controller
        .set_frame_generation_tech(FrameGenerationTech::VendorB);
    assert_eq!(
        h.controller.get_effective_display_mode(),
        EffectiveDisplayMode::ScRgb
    );

    set_mode(&h.controller, 2);
    h.controller
        .set_frame_generation_tech(FrameGenerationTech::VendorA);
    assert_eq!(
        h.controller.get_effective_display_mode(),
        EffectiveDisplayMode::Hdr10
    );

    h.controller
        .set_setting(keys::ENFORCE_USER_DISPLAY_MODE, StoredValue::Bool(true))
        .unwrap();
    assert_eq!(
        h.controller.get_effective_display_mode(),
        EffectiveDisplayMode::ScRgb
    );
}

#[test]
fn test_shim_keeps_vendor_a_on_wide_surface() {
    let h = harness_with(
        SettingsStore::in_memory(),
        MockDisplay::hdr_enabled(1000.0),
        &["SFShaderInjector.dll", "dlssg_to_fsr3_amd_is_better.dll"],
    );
    set_mode(&h.controller, 1);
    h.controller
        .set_frame_generation_tech(FrameGenerationTech::VendorA);
    assert_eq!(
        h.controller.get_effective_display_mode(),
        EffectiveDisplayMode::ScRgb
    );

    set_mode(&h.controller, 2);
    assert_eq!(
        h.controller.get_effective_display_mode(),
        EffectiveDisplayMode::ScRgb
    );
}

#[test]
fn test_format_and_color_space_share_family() {
    let h = hdr_harness();
    let techs = [
        FrameGenerationTech::None,
        FrameGenerationTech::VendorA,
        FrameGenerationTech::VendorB,
    ];
    for force in [false, true] {
        h.controller
            .set_setting(keys::FORCE_SDR_ON_HDR, StoredValue::Bool(force))
            .unwrap();
        for mode in 0..3 {
            set_mode(&h.controller, mode);
            for tech in techs {
                h.controller.set_frame_generation_tech(tech);
                assert_eq!(
                    h.controller.get_buffer_format().family(),
                    h.controller.get_color_space().family(),
                    "mode {} force {} tech {:?}",
                    mode,
                    force,
                    tech
                );
            }
        }
    }
}

#[test]
fn test_frame_generation_change_applies_at_frame_boundary() {
    let h = hdr_harness();
    set_mode(&h.controller, 1);
    assert_eq!(
        h.controller.applied_surface_mode(),
        Some(EffectiveDisplayMode::Hdr10)
    );
    h.surface.clear();

    h.controller
        .set_frame_generation_tech(FrameGenerationTech::VendorB);
    h.controller.on_frame_boundary(false);
    assert!(h.surface.calls().is_empty());

    h.controller.on_frame_boundary(true);
    assert_eq!(
        h.controller.applied_surface_mode(),
        Some(EffectiveDisplayMode::ScRgb)
    );
    assert_eq!(
        h.surface.calls(),
        vec![
            SurfaceCall::SetBufferFormat(BufferFormat::R16G16B16A16Float),
            SurfaceCall::Reconfigure,
            SurfaceCall::SetColorSpace(ColorSpace::RgbFullG10P709),
        ]
    );
}

#[test]
fn test_mode_change_requests_frame_generation_refresh() {
    let h = hdr_harness();
    set_mode(&h.controller, 1);
    assert!(!h.controller.take_frame_generation_refresh());

    h.controller
        .set_frame_generation_tech(FrameGenerationTech::VendorB);
    set_mode(&h.controller, 2);
    assert!(h.controller.take_frame_generation_refresh());
    assert!(!h.controller.take_frame_generation_refresh());
}

#[test]
fn test_unchanged_setting_does_not_reconfigure() {
    let h = hdr_harness();
    set_mode(&h.controller, 2);
    let reconfigures = h.surface.reconfigure_count();
    set_mode(&h.controller, 2);
    assert_eq!(h.surface.reconfigure_count(), reconfigures);
}

#[test]
fn test_peak_brightness_detected_once() {
    let path = temp_store("peak");
    let h = harness_with(
        SettingsStore::open(&path).unwrap(),
        MockDisplay::hdr_enabled(750.0),
        &["SFShaderInjector.dll"],
    );
    let settings = h.controller.settings();
    assert!(settings.peak_brightness_auto_detected);
    assert_eq!(settings.peak_brightness, 750);

    h.display.set_max_luminance(1200.0);
    h.controller.on_monitor_or_window_changed();
    let settings = h.controller.settings();
    assert_eq!(settings.peak_brightness, 750);
    assert_eq!(settings.peak_brightness_baseline, 1200.0);

    // Resetting picks up the new baseline.
    h.controller.reset_setting(keys::PEAK_BRIGHTNESS).unwrap();
    assert_eq!(h.controller.settings().peak_brightness, 1200);

    // A fresh session keeps the persisted value and flag.
    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.get_bool(keys::PEAK_BRIGHTNESS_AUTO_DETECTED), Some(true));
    let h2 = harness_with(store, MockDisplay::hdr_enabled(400.0), &["SFShaderInjector.dll"]);
    assert_eq!(h2.controller.settings().peak_brightness, 1200);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_hdr_mode_falls_back_on_sdr_display() {
    let path = temp_store("fallback");
    let mut store = SettingsStore::open(&path).unwrap();
    store.set(keys::DISPLAY_MODE, 1);
    store.save().unwrap();

    let h = harness_with(
        SettingsStore::open(&path).unwrap(),
        MockDisplay::sdr_only(),
        &["SFShaderInjector.dll"],
    );
    assert!(!h.controller.is_hdr_supported());
    assert_eq!(h.controller.settings().display_mode, DisplayMode::Sdr);
    assert_eq!(
        h.controller.get_effective_display_mode(),
        EffectiveDisplayMode::Sdr
    );

    // The stored preference is untouched.
    let reloaded = SettingsStore::open(&path).unwrap();
    assert_eq!(reloaded.get_int(keys::DISPLAY_MODE), Some(1));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_os_hdr_enabled_once() {
    let mut store = SettingsStore::in_memory();
    store.set(keys::DISPLAY_MODE, 2);
    let h = harness_with(
        store,
        MockDisplay::hdr_disabled(600.0),
        &["SFShaderInjector.dll"],
    );
    assert_eq!(h.display.enable_attempts(), 1);
    assert!(h.controller.is_hdr_enabled());
    assert_eq!(h.controller.settings().peak_brightness, 600);
}

#[test]
fn test_failed_enable_is_not_retried() {
    let mut store = SettingsStore::in_memory();
    store.set(keys::DISPLAY_MODE, 1);
    let display = MockDisplay::hdr_disabled(600.0);
    display.fail_enable(true);
    let h = harness_with(store, display, &["SFShaderInjector.dll"]);

    assert_eq!(h.display.enable_attempts(), 1);
    assert!(!h.controller.is_hdr_enabled());
    assert!(!h.controller.settings().peak_brightness_auto_detected);
}

#[test]
fn test_display_query_failure_keeps_cached_state() {
    let h = hdr_harness();
    set_mode(&h.controller, 1);
    h.display.fail_queries(true);
    h.controller.on_monitor_or_window_changed();

    assert!(h.controller.is_hdr_supported());
    assert_eq!(
        h.controller.get_effective_display_mode(),
        EffectiveDisplayMode::Hdr10
    );
}

#[test]
fn test_monitor_change_reapplies_color_space() {
    let h = hdr_harness();
    set_mode(&h.controller, 1);
    h.surface.clear();

    h.controller.on_monitor_or_window_changed();
    assert_eq!(
        h.surface.calls(),
        vec![SurfaceCall::SetColorSpace(ColorSpace::RgbFullG2084P2020)]
    );
}

#[test]
fn test_shader_constants_follow_settings() {
    let h = hdr_harness();
    for (value, expected) in [(0, 0.5f32), (50, 1.0), (100, 1.5)] {
        h.controller
            .set_setting(keys::SATURATION, StoredValue::Int(value))
            .unwrap();
        let constants = h.controller.build_shader_constants();
        assert!(
            (constants.saturation - expected).abs() < 1e-4,
            "saturation {} -> {}",
            value,
            constants.saturation
        );
    }

    // Out-of-range values are clamped.
    h.controller
        .set_setting(keys::CONTRAST, StoredValue::Int(400))
        .unwrap();
    assert_eq!(h.controller.settings().contrast, 100);
}

#[test]
fn test_hdr_screenshot_overrides_peak() {
    let h = hdr_harness();
    set_mode(&h.controller, 2);
    h.controller
        .set_setting(keys::PEAK_BRIGHTNESS, StoredValue::Int(800))
        .unwrap();
    assert_eq!(h.controller.build_shader_constants().peak_brightness, 800.0);

    h.controller.request_screenshot(true, false);
    assert_eq!(
        h.controller.build_shader_constants().peak_brightness,
        10000.0
    );
}

#[test]
fn test_settings_persist_to_file() {
    let path = temp_store("persist");
    let h = harness_with(
        SettingsStore::open(&path).unwrap(),
        MockDisplay::sdr_only(),
        &["SFShaderInjector.dll"],
    );
    h.controller
        .set_setting(keys::POST_SHARPEN, StoredValue::Bool(false))
        .unwrap();
    h.controller
        .set_setting(keys::FILM_GRAIN_FPS_LIMIT, StoredValue::Int(30))
        .unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.get_bool(keys::POST_SHARPEN), Some(false));
    assert_eq!(store.get_int(keys::FILM_GRAIN_FPS_LIMIT), Some(30));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_ui_sync() {
    let h = hdr_harness();
    let mut ui = MockSettingsUi::full();

    h.controller.sync_ui(&mut ui);
    assert_eq!(ui.enabled(keys::DISPLAY_MODE), Some(true));
    assert_eq!(ui.enabled(keys::PEAK_BRIGHTNESS), Some(false));
    assert_eq!(ui.value(keys::PEAK_BRIGHTNESS), Some(StoredValue::Int(1000)));

    set_mode(&h.controller, 1);
    h.controller.sync_ui(&mut ui);
    assert_eq!(ui.enabled(keys::PEAK_BRIGHTNESS), Some(true));
    assert_eq!(ui.enabled(keys::SECONDARY_BRIGHTNESS), Some(false));
    assert_eq!(ui.value(keys::DISPLAY_MODE), Some(StoredValue::Int(1)));
}
