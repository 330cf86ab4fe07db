//! In-memory collaborators for tests and host-less use.
//!
//! Every mock records what it was asked to do so tests can assert on call
//! order and counts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use half::f16;
use parking_lot::Mutex;

use crate::color::{BufferFormat, ColorPixelFormat, ColorSpace};
use crate::display::{AdvancedColorInfo, DisplayColorApi, HostEnvironment, MonitorInfo, OutputHandle};
use crate::error::{Error, Result};
use crate::screenshot::{ReadbackImage, RenderBackend, ResourceHandle, ResourceState};
use crate::settings::{SettingsUi, StoredValue};
use crate::swapchain::SurfaceBackend;

struct DisplayState {
    info: AdvancedColorInfo,
    max_luminance: f32,
    fail_queries: bool,
    fail_enable: bool,
    enable_attempts: usize,
}

/// A display whose advanced color state lives in memory.
pub struct MockDisplay {
    state: Mutex<DisplayState>,
}

impl MockDisplay {
    pub fn new(info: AdvancedColorInfo, max_luminance: f32) -> Self {
        Self {
            state: Mutex::new(DisplayState {
                info,
                max_luminance,
                fail_queries: false,
                fail_enable: false,
                enable_attempts: 0,
            }),
        }
    }

    /// HDR capable, OS HDR on.
    pub fn hdr_enabled(max_luminance: f32) -> Self {
        Self::new(AdvancedColorInfo::from_bits(0b11, 10), max_luminance)
    }

    /// HDR capable, OS HDR off.
    pub fn hdr_disabled(max_luminance: f32) -> Self {
        Self::new(AdvancedColorInfo::from_bits(0b01, 10), max_luminance)
    }

    pub fn sdr_only() -> Self {
        Self::new(AdvancedColorInfo::from_bits(0, 8), 270.0)
    }

    pub fn set_info(&self, info: AdvancedColorInfo) {
        self.state.lock().info = info;
    }

    pub fn set_max_luminance(&self, nits: f32) {
        self.state.lock().max_luminance = nits;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.state.lock().fail_queries = fail;
    }

    pub fn fail_enable(&self, fail: bool) {
        self.state.lock().fail_enable = fail;
    }

    pub fn enable_attempts(&self) -> usize {
        self.state.lock().enable_attempts
    }
}

impl DisplayColorApi for MockDisplay {
    fn advanced_color_info(&self, _output: OutputHandle) -> Result<AdvancedColorInfo> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(Error::DisplayQuery("no display path for output".to_string()));
        }
        Ok(state.info)
    }

    fn set_advanced_color_enabled(&self, _output: OutputHandle, enabled: bool) -> Result<()> {
        let mut state = self.state.lock();
        state.enable_attempts += 1;
        if state.fail_enable {
            return Err(Error::DisplayQuery("advanced color state rejected".to_string()));
        }
        state.info.enabled = enabled;
        Ok(())
    }

    fn max_luminance(&self, _output: OutputHandle) -> Result<f32> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(Error::DisplayQuery("no output description".to_string()));
        }
        Ok(state.max_luminance)
    }

    fn enumerate_monitors(&self) -> Result<Vec<MonitorInfo>> {
        let state = self.state.lock();
        if state.fail_queries {
            return Err(Error::DisplayQuery("monitor enumeration failed".to_string()));
        }
        Ok(vec![MonitorInfo {
            name: "\\\\.\\DISPLAY1".to_string(),
            is_primary: true,
            width: 3840,
            height: 2160,
            color: state.info,
            max_luminance: Some(state.max_luminance),
        }])
    }
}

/// A host process with a fixed set of loaded modules.
#[derive(Default)]
pub struct MockHost {
    modules: Mutex<HashSet<String>>,
}

impl MockHost {
    pub fn with_modules(modules: &[&str]) -> Self {
        Self {
            modules: Mutex::new(modules.iter().map(|m| m.to_ascii_lowercase()).collect()),
        }
    }

    pub fn load(&self, module: &str) {
        self.modules.lock().insert(module.to_ascii_lowercase());
    }
}

impl HostEnvironment for MockHost {
    fn is_module_loaded(&self, name: &str) -> bool {
        self.modules.lock().contains(&name.to_ascii_lowercase())
    }
}

/// A call made on a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCall {
    SetBufferFormat(BufferFormat),
    Reconfigure,
    SetColorSpace(ColorSpace),
}

#[derive(Default)]
struct SurfaceLog {
    calls: Vec<SurfaceCall>,
    fail_reconfigure: bool,
}

/// Surface backend that records calls. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.log.lock().calls.clone()
    }

    pub fn reconfigure_count(&self) -> usize {
        self.log
            .lock()
            .calls
            .iter()
            .filter(|c| **c == SurfaceCall::Reconfigure)
            .count()
    }

    pub fn clear(&self) {
        self.log.lock().calls.clear();
    }

    pub fn fail_reconfigure(&self, fail: bool) {
        self.log.lock().fail_reconfigure = fail;
    }
}

impl SurfaceBackend for RecordingSurface {
    fn set_buffer_format(&mut self, format: BufferFormat) -> Result<()> {
        self.log.lock().calls.push(SurfaceCall::SetBufferFormat(format));
        Ok(())
    }

    fn request_surface_reconfigure(&mut self) -> Result<()> {
        let mut log = self.log.lock();
        if log.fail_reconfigure {
            return Err(Error::Backend("surface recreation failed".to_string()));
        }
        log.calls.push(SurfaceCall::Reconfigure);
        Ok(())
    }

    fn set_color_space(&mut self, color_space: ColorSpace) -> Result<()> {
        self.log.lock().calls.push(SurfaceCall::SetColorSpace(color_space));
        Ok(())
    }
}

/// A call made on a [`MockRenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    CreateCopyTarget(ResourceHandle),
    Transition {
        resource: ResourceHandle,
        before: ResourceState,
        after: ResourceState,
    },
    Copy {
        dest: ResourceHandle,
        source: ResourceHandle,
    },
    Submit,
    ReadBack(ResourceHandle),
    Release(ResourceHandle),
}

struct BackendState {
    render_target: Option<ResourceHandle>,
    next_id: u64,
    live: HashSet<ResourceHandle>,
    calls: Vec<BackendCall>,
    fill: [f32; 4],
    fail_readback: bool,
}

/// Render backend whose render target is a solid RGBA16F color.
pub struct MockRenderBackend {
    width: u32,
    height: u32,
    state: Mutex<BackendState>,
}

impl MockRenderBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Mutex::new(BackendState {
                render_target: Some(ResourceHandle(1)),
                next_id: 100,
                live: HashSet::new(),
                calls: Vec::new(),
                fill: [1.0, 1.0, 1.0, 1.0],
                fail_readback: false,
            }),
        }
    }

    pub fn set_render_target(&self, target: Option<ResourceHandle>) {
        self.state.lock().render_target = target;
    }

    /// Color of every texel, in the surface's encoding.
    pub fn set_fill(&self, rgba: [f32; 4]) {
        self.state.lock().fill = rgba;
    }

    pub fn fail_readback(&self, fail: bool) {
        self.state.lock().fail_readback = fail;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Copy targets created and not yet released.
    pub fn live_resources(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn copies(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Copy { .. }))
            .count()
    }
}

impl RenderBackend for MockRenderBackend {
    fn current_render_target(&self) -> Option<ResourceHandle> {
        self.state.lock().render_target
    }

    fn create_copy_target(&self, source: ResourceHandle) -> Result<ResourceHandle> {
        let mut state = self.state.lock();
        let handle = ResourceHandle(state.next_id);
        state.next_id += 1;
        state.live.insert(handle);
        state.calls.push(BackendCall::CreateCopyTarget(source));
        Ok(handle)
    }

    fn transition(&self, resource: ResourceHandle, before: ResourceState, after: ResourceState) {
        self.state.lock().calls.push(BackendCall::Transition {
            resource,
            before,
            after,
        });
    }

    fn copy_resource(&self, dest: ResourceHandle, source: ResourceHandle) {
        self.state.lock().calls.push(BackendCall::Copy { dest, source });
    }

    fn submit(&self) -> Result<()> {
        self.state.lock().calls.push(BackendCall::Submit);
        Ok(())
    }

    fn read_back(&self, resource: ResourceHandle) -> Result<ReadbackImage> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::ReadBack(resource));
        if state.fail_readback {
            return Err(Error::Backend("map failed".to_string()));
        }
        if !state.live.contains(&resource) {
            return Err(Error::Backend(format!("unknown resource {:?}", resource)));
        }

        let texel: Vec<u8> = state
            .fill
            .iter()
            .flat_map(|&c| f16::from_f32(c).to_le_bytes())
            .collect();
        let format = ColorPixelFormat::Rgba16f;
        let row_pitch = self.width as usize * format.bytes_per_pixel();
        let data = texel
            .iter()
            .copied()
            .cycle()
            .take(row_pitch * self.height as usize)
            .collect();
        Ok(ReadbackImage {
            width: self.width,
            height: self.height,
            row_pitch,
            format,
            data,
        })
    }

    fn release(&self, resource: ResourceHandle) {
        let mut state = self.state.lock();
        state.live.remove(&resource);
        state.calls.push(BackendCall::Release(resource));
    }
}

/// Settings menu that remembers pushed values and enabled states.
#[derive(Default)]
pub struct MockSettingsUi {
    ids: HashSet<String>,
    values: HashMap<String, StoredValue>,
    enabled: HashMap<String, bool>,
}

impl MockSettingsUi {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// A menu that knows every setting.
    pub fn full() -> Self {
        let ids: Vec<&str> = crate::settings::SETTINGS.iter().map(|d| d.key).collect();
        Self::with_ids(&ids)
    }

    pub fn value(&self, id: &str) -> Option<StoredValue> {
        self.values.get(id).cloned()
    }

    pub fn enabled(&self, id: &str) -> Option<bool> {
        self.enabled.get(id).copied()
    }
}

impl SettingsUi for MockSettingsUi {
    fn find_setting(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn set_enabled(&mut self, id: &str, enabled: bool) {
        self.enabled.insert(id.to_string(), enabled);
    }

    fn set_value(&mut self, id: &str, value: StoredValue) {
        self.values.insert(id.to_string(), value);
    }
}
