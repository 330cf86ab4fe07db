//! The color controller context.
//!
//! One [`ColorController`] is created at attach time and handed to every
//! call site. Per-draw getters read atomics only; mode changes run on the
//! designated settings/frame-boundary thread.

use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::color::{surface_for_mode, BufferFormat, ColorSpace};
use crate::display::{
    apply_detected_peak_brightness, resolve_display_mode, DisplayColorApi, DisplayMode,
    DisplayModeInputs, EffectiveDisplayMode, FrameGenerationTech, HdrState, HostEnvironment,
    MonitorInfo, OutputHandle, PeakDetection,
};
use crate::error::{Error, Result};
use crate::screenshot::{
    CaptureKind, CaptureParams, RenderBackend, ScreenshotConfig, ScreenshotPipeline,
};
use crate::settings::{
    descriptor, keys, sync_settings_ui, ColorSettings, LiveSettings, SettingKind, SettingsStore,
    SettingsUi, StoredValue,
};
use crate::shader::{build_shader_constants, FrameState, ShaderConstants};
use crate::swapchain::{SurfaceBackend, SwapchainTransition, TransitionOutcome};

/// Predecessor plugins that patch the same render targets.
pub const LEGACY_MODULES: [&str; 4] = [
    "NativeHDR.dll",
    "NativeHDR.asi",
    "NativeAutoHDR.dll",
    "NativeAutoHDR.asi",
];

/// Shader injection module required to replace the tone-mapping shaders.
pub const SHADER_INJECTOR_MODULES: [&str; 2] = ["SFShaderInjector.dll", "SFShaderInjector.asi"];

/// Translation layer that runs `VendorB`-style frame generation through the
/// `VendorA` interface.
pub const FRAME_GENERATION_SHIM_MODULE: &str = "dlssg_to_fsr3_amd_is_better.dll";

/// Settings that feed the display mode resolver.
const MODE_KEYS: [&str; 3] = [
    keys::DISPLAY_MODE,
    keys::FORCE_SDR_ON_HDR,
    keys::ENFORCE_USER_DISPLAY_MODE,
];

struct SurfaceSlot {
    backend: Box<dyn SurfaceBackend>,
    transition: SwapchainTransition,
}

pub struct ColorController {
    settings: Mutex<ColorSettings>,
    store: Mutex<SettingsStore>,
    live: LiveSettings,
    hdr: HdrState,
    display: Arc<dyn DisplayColorApi>,
    host: Arc<dyn HostEnvironment>,
    output: AtomicIsize,
    surface: Mutex<SurfaceSlot>,
    screenshots: ScreenshotPipeline,
    frame_generation: AtomicU8,
    frame_generation_shim: AtomicBool,
    frame_generation_refresh: AtomicBool,
    is_at_end_of_frame: AtomicBool,
    frame_index: AtomicU64,
    /// Set once the compatibility probe passed; the surface is managed
    /// only from then on.
    initialized: AtomicBool,
    started: Instant,
}

impl ColorController {
    /// Build the controller and load settings from `store`.
    pub fn new(
        store: SettingsStore,
        display: Arc<dyn DisplayColorApi>,
        host: Arc<dyn HostEnvironment>,
        surface: Box<dyn SurfaceBackend>,
        render: Arc<dyn RenderBackend>,
        screenshots: ScreenshotConfig,
    ) -> Self {
        let settings = ColorSettings::load_from(&store);
        info!(
            "Color settings loaded: display mode {}, peak brightness {} nits",
            settings.display_mode.index(),
            settings.peak_brightness
        );

        Self {
            live: LiveSettings::new(&settings),
            settings: Mutex::new(settings),
            store: Mutex::new(store),
            hdr: HdrState::new(),
            display,
            host,
            output: AtomicIsize::new(0),
            surface: Mutex::new(SurfaceSlot {
                backend: surface,
                transition: SwapchainTransition::new(),
            }),
            screenshots: ScreenshotPipeline::new(render, screenshots),
            frame_generation: AtomicU8::new(FrameGenerationTech::None.index()),
            frame_generation_shim: AtomicBool::new(false),
            frame_generation_refresh: AtomicBool::new(false),
            is_at_end_of_frame: AtomicBool::new(false),
            frame_index: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
            started: Instant::now(),
        }
    }

    // ---- initialization ----

    /// Probe the host process, read the output's HDR state and apply the
    /// initial surface format.
    ///
    /// Fails only on module preconditions. Display query failures degrade to
    /// "HDR unsupported".
    pub fn init_compatibility(&self, output: OutputHandle) -> Result<()> {
        if let Some(module) = LEGACY_MODULES
            .into_iter()
            .find(|m| self.host.is_module_loaded(m))
        {
            error!(
                "{} is loaded and conflicts with this plugin; HDR features are disabled",
                module
            );
            return Err(Error::ConflictingModule { module });
        }

        if !SHADER_INJECTOR_MODULES
            .iter()
            .any(|m| self.host.is_module_loaded(m))
        {
            let module = SHADER_INJECTOR_MODULES[0];
            error!("{} is not loaded; HDR features are disabled", module);
            return Err(Error::MissingDependency { module });
        }

        if self.host.is_module_loaded(FRAME_GENERATION_SHIM_MODULE) {
            info!("Frame generation compatibility shim detected");
            self.frame_generation_shim.store(true, Ordering::Release);
        }

        self.log_monitors();
        self.set_output(output);
        self.refresh_hdr_display_support_state();
        self.refresh_hdr_display_enable_state();
        self.initialized.store(true, Ordering::Release);
        self.apply_surface_mode();
        Ok(())
    }

    /// Monitors attached to the desktop with their advanced color state.
    pub fn monitors(&self) -> Result<Vec<MonitorInfo>> {
        self.display.enumerate_monitors()
    }

    fn log_monitors(&self) {
        let monitors = match self.monitors() {
            Ok(monitors) => monitors,
            Err(e) => {
                warn!("Monitor enumeration failed: {}", e);
                return;
            }
        };
        for monitor in &monitors {
            info!(
                "Monitor {}{}: {}x{}, HDR supported {}, enabled {}, {} bpc, peak {}",
                monitor.name,
                if monitor.is_primary { " (primary)" } else { "" },
                monitor.width,
                monitor.height,
                monitor.color.supported && !monitor.color.force_disabled,
                monitor.color.enabled,
                monitor.color.bits_per_color_channel,
                monitor
                    .max_luminance
                    .map_or_else(|| "unknown".to_string(), |nits| format!("{} nits", nits)),
            );
        }
    }

    /// Window that owns the output surface.
    pub fn set_output(&self, output: OutputHandle) {
        self.output.store(output.0, Ordering::Release);
    }

    pub fn output(&self) -> OutputHandle {
        OutputHandle(self.output.load(Ordering::Acquire))
    }

    // ---- HDR state ----

    /// Re-poll OS HDR support. Returns whether HDR is supported.
    ///
    /// An HDR display mode on a display without HDR falls back to SDR for
    /// this session; the stored setting is kept.
    pub fn refresh_hdr_display_support_state(&self) -> bool {
        self.hdr
            .refresh_support_state(self.display.as_ref(), self.output());
        let supported = self.hdr.is_supported();

        if !supported {
            let mut settings = self.settings.lock();
            if settings.display_mode.is_hdr() {
                warn!(
                    "HDR is not supported on the current display, using SDR instead of mode {}",
                    settings.display_mode.index()
                );
                settings.display_mode = DisplayMode::Sdr;
                self.live.publish(&settings);
            }
        }
        supported
    }

    /// Enable OS HDR if the game wants it (one attempt), then pick up the
    /// display peak luminance. Returns whether OS HDR is enabled.
    pub fn refresh_hdr_display_enable_state(&self) -> bool {
        let wants_hdr = self.settings.lock().is_display_mode_hdr();
        let enabled = self
            .hdr
            .refresh_enable_state(self.display.as_ref(), self.output(), wants_hdr);
        if enabled {
            self.detect_peak_brightness();
        }
        enabled
    }

    fn detect_peak_brightness(&self) {
        let nits = match self.display.max_luminance(self.output()) {
            Ok(nits) if nits.is_finite() && nits > 0.0 => nits,
            Ok(nits) => {
                warn!("Ignoring reported peak luminance {}", nits);
                return;
            }
            Err(e) => {
                warn!("Peak luminance query failed: {}", e);
                return;
            }
        };

        let mut settings = self.settings.lock();
        match apply_detected_peak_brightness(&mut settings, nits) {
            PeakDetection::Applied(detected) => {
                info!(
                    "Peak brightness auto-detected: {} nits (set to {})",
                    detected, settings.peak_brightness
                );
                self.persist(&settings);
            }
            PeakDetection::BaselineOnly(detected) => {
                debug!("Peak brightness default updated to {} nits", detected);
            }
        }
        self.live.publish(&settings);
    }

    pub fn is_hdr_supported(&self) -> bool {
        self.hdr.is_supported()
    }

    pub fn is_hdr_enabled(&self) -> bool {
        self.hdr.is_enabled()
    }

    // ---- display mode ----

    fn mode_inputs(&self, settings: &ColorSettings, acknowledge_screenshots: bool) -> DisplayModeInputs {
        let request = self.screenshots.request();
        DisplayModeInputs {
            requested: settings.display_mode,
            force_sdr_on_hdr: settings.force_sdr_on_hdr,
            want_sdr_screenshot: acknowledge_screenshots && request.want_sdr(),
            want_hdr_screenshot: acknowledge_screenshots && request.want_hdr(),
            frame_generation: self.frame_generation(),
            frame_generation_shim: self.frame_generation_shim.load(Ordering::Acquire),
            enforce_user_mode: settings.enforce_user_display_mode,
        }
    }

    /// Display mode applied to the current frame's tone output.
    pub fn get_effective_display_mode(&self) -> EffectiveDisplayMode {
        resolve_display_mode(&self.mode_inputs(&self.live.snapshot(), true))
    }

    /// Display mode that determines the output surface. Ignores screenshot
    /// requests so a capture never recreates the surface.
    pub fn surface_display_mode(&self) -> EffectiveDisplayMode {
        resolve_display_mode(&self.mode_inputs(&self.live.snapshot(), false))
    }

    pub fn get_buffer_format(&self) -> BufferFormat {
        surface_for_mode(self.surface_display_mode()).format
    }

    pub fn get_color_space(&self) -> ColorSpace {
        surface_for_mode(self.surface_display_mode()).color_space
    }

    /// Apply the surface mode through the transition driver.
    fn apply_surface_mode(&self) -> Option<TransitionOutcome> {
        let mode = self.surface_display_mode();
        let mut slot = self.surface.lock();
        let SurfaceSlot {
            backend,
            transition,
        } = &mut *slot;
        match transition.apply(backend.as_mut(), mode) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Failed to switch output surface to mode {}: {}", mode.index(), e);
                None
            }
        }
    }

    /// Surface mode last applied by the transition driver.
    pub fn applied_surface_mode(&self) -> Option<EffectiveDisplayMode> {
        self.surface.lock().transition.applied_mode()
    }

    // ---- frame generation ----

    pub fn frame_generation(&self) -> FrameGenerationTech {
        FrameGenerationTech::from_index(self.frame_generation.load(Ordering::Acquire))
    }

    /// Record the frame-generation tech reported by the renderer. Takes
    /// effect at the next end-of-frame boundary.
    pub fn set_frame_generation_tech(&self, tech: FrameGenerationTech) {
        let previous = self.frame_generation.swap(tech.index(), Ordering::AcqRel);
        if previous != tech.index() {
            debug!(
                "Frame generation changed: {:?} -> {:?}",
                FrameGenerationTech::from_index(previous),
                tech
            );
        }
    }

    pub fn has_frame_generation_shim(&self) -> bool {
        self.frame_generation_shim.load(Ordering::Acquire)
    }

    /// Whether frame generation must be re-initialized after a display
    /// mode change. Clears the flag.
    pub fn take_frame_generation_refresh(&self) -> bool {
        self.frame_generation_refresh.swap(false, Ordering::AcqRel)
    }

    // ---- shader constants ----

    /// Constant buffer for the current draw.
    pub fn build_shader_constants(&self) -> ShaderConstants {
        build_shader_constants(&self.live.snapshot(), &self.frame_state())
    }

    fn frame_state(&self) -> FrameState {
        let request = self.screenshots.request();
        FrameState {
            is_at_end_of_frame: self.is_at_end_of_frame.load(Ordering::Acquire),
            want_sdr_screenshot: request.want_sdr(),
            want_hdr_screenshot: request.want_hdr(),
            frame_generation: self.frame_generation(),
            frame_generation_shim: self.frame_generation_shim.load(Ordering::Acquire),
            runtime_ms: self.started.elapsed().as_secs_f32() * 1000.0,
        }
    }

    // ---- screenshots ----

    /// Request a capture of the next presented frame.
    ///
    /// HDR captures are only taken while the game renders HDR with HDR
    /// screenshots enabled. An SDR capture while rendering HDR switches the
    /// tone output to SDR for the capture frame.
    pub fn request_screenshot(&self, want_hdr: bool, want_sdr: bool) -> Option<CaptureKind> {
        let settings = self.live.snapshot();
        let allow_hdr = settings.hdr_screenshots && settings.is_game_rendering_hdr(false);
        if want_hdr && !allow_hdr {
            debug!("HDR screenshot ignored: game is not rendering HDR or HDR screenshots are off");
        }
        self.screenshots.request().request(want_hdr && allow_hdr, want_sdr)
    }

    pub fn pending_capture_count(&self) -> usize {
        self.screenshots.pending_count()
    }

    /// Wait for in-flight screenshot writes.
    pub fn join_screenshot_workers(&self) {
        self.screenshots.join_workers();
    }

    // ---- frame boundary ----

    /// Frames completed so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index.load(Ordering::Acquire)
    }

    /// Called by the render thread at the start (`false`) and end (`true`)
    /// of each frame.
    ///
    /// At the end of a frame: issue the pending capture, hand captures past
    /// their delay to encode workers, follow frame-generation changes and
    /// advance the frame index.
    pub fn on_frame_boundary(&self, is_end_of_frame: bool) {
        self.is_at_end_of_frame
            .store(is_end_of_frame, Ordering::Release);
        if !is_end_of_frame {
            return;
        }

        let frame = self.frame_index();
        if self.screenshots.request().pending().is_some() {
            let constants = self.build_shader_constants();
            let settings = self.live.snapshot();
            let params = CaptureParams {
                color_space: surface_for_mode(self.surface_display_mode()).color_space,
                peak_nits: constants.peak_brightness,
                lossless: settings.hdr_screenshots_lossless,
            };
            self.screenshots.capture_pending(frame, params);
        }
        self.screenshots.service(frame);

        let mode = self.surface_display_mode();
        let applied = self.applied_surface_mode();
        if self.initialized.load(Ordering::Acquire) && applied != Some(mode) {
            match applied {
                Some(_) => debug!("Surface mode changed at frame boundary, applying {}", mode.index()),
                None => debug!("Retrying initial surface setup with mode {}", mode.index()),
            }
            self.apply_surface_mode();
        }

        self.frame_index.store(frame + 1, Ordering::Release);
    }

    // ---- settings ----

    /// Copy of the authoritative settings.
    pub fn settings(&self) -> ColorSettings {
        *self.settings.lock()
    }

    /// Settings-changed callback.
    ///
    /// Validates and clamps the value, saves the store, republishes the
    /// hot-path copy and re-resolves the display mode when a mode input
    /// changed.
    pub fn set_setting(&self, id: &str, value: StoredValue) -> Result<()> {
        let desc = descriptor(id).ok_or_else(|| Error::Settings(format!("unknown setting {}", id)))?;
        let parsed = match desc.kind {
            SettingKind::Checkbox => value.as_bool().map(i32::from),
            _ => value.as_int(),
        }
        .ok_or_else(|| Error::Settings(format!("invalid value {:?} for {}", value, id)))?;

        {
            let mut settings = self.settings.lock();
            let before = desc.read(&settings);
            desc.write(&mut settings, parsed);
            let after = desc.read(&settings);
            if before == after {
                return Ok(());
            }
            info!("Setting {} changed: {} -> {}", id, before, after);

            let mut store = self.store.lock();
            settings.store_into(&mut store);
            store.save()?;
            drop(store);

            self.live.publish(&settings);
        }

        if MODE_KEYS.contains(&desc.key) {
            self.on_display_mode_setting_changed();
        }
        Ok(())
    }

    /// Reset a setting to its default.
    pub fn reset_setting(&self, id: &str) -> Result<()> {
        let desc = descriptor(id).ok_or_else(|| Error::Settings(format!("unknown setting {}", id)))?;
        let default = desc.default_for(&self.settings.lock());
        let value = match desc.kind {
            SettingKind::Checkbox => StoredValue::Bool(default != 0),
            _ => StoredValue::from(default),
        };
        self.set_setting(id, value)
    }

    fn persist(&self, settings: &ColorSettings) {
        let mut store = self.store.lock();
        settings.store_into(&mut store);
        if let Err(e) = store.save() {
            warn!("Failed to save settings: {}", e);
        }
    }

    /// Push values and enabled states to the settings menu.
    pub fn sync_ui(&self, ui: &mut dyn SettingsUi) {
        let settings = self.settings();
        sync_settings_ui(ui, &settings, self.hdr.is_supported());
    }

    // ---- events ----

    /// Display mode, SDR override or enforcement flag changed.
    pub fn on_display_mode_setting_changed(&self) {
        if self.frame_generation() == FrameGenerationTech::VendorB {
            self.frame_generation_refresh.store(true, Ordering::Release);
        }
        self.refresh_hdr_display_support_state();
        self.refresh_hdr_display_enable_state();
        self.apply_surface_mode();
    }

    /// The output window was moved or the monitor configuration changed.
    pub fn on_monitor_or_window_changed(&self) {
        self.refresh_hdr_display_support_state();
        self.refresh_hdr_display_enable_state();

        let mut slot = self.surface.lock();
        let SurfaceSlot {
            backend,
            transition,
        } = &mut *slot;
        if let Err(e) = transition.reapply_color_space(backend.as_mut()) {
            warn!("Failed to re-apply the output color space: {}", e);
        }
    }
}
