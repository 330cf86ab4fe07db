// Windows implementation of the display collaborators.
//
// Advanced color state comes from the DisplayConfig API: the window's
// HMONITOR is resolved to its GDI device name, which is matched against the
// source name of each active display path. Peak luminance comes from the
// DXGI output description of the same monitor.

use windows::core::{Interface, BOOL, HSTRING};
use windows::Win32::Devices::Display::{
    DisplayConfigGetDeviceInfo, DisplayConfigSetDeviceInfo, GetDisplayConfigBufferSizes,
    QueryDisplayConfig, DISPLAYCONFIG_DEVICE_INFO_GET_ADVANCED_COLOR_INFO,
    DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME, DISPLAYCONFIG_DEVICE_INFO_HEADER,
    DISPLAYCONFIG_DEVICE_INFO_SET_ADVANCED_COLOR_STATE, DISPLAYCONFIG_MODE_INFO,
    DISPLAYCONFIG_PATH_INFO, DISPLAYCONFIG_SOURCE_DEVICE_NAME, QDC_ONLY_ACTIVE_PATHS,
};
use windows::Win32::Foundation::{HWND, LPARAM, RECT, WIN32_ERROR};
use windows::Win32::Graphics::Dxgi::{CreateDXGIFactory1, IDXGIFactory1, IDXGIOutput6};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, MonitorFromWindow, HDC, HMONITOR, MONITORINFO,
    MONITORINFOEXW, MONITOR_DEFAULTTONULL,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;

use super::types::{AdvancedColorInfo, DisplayColorApi, HostEnvironment, MonitorInfo, OutputHandle};
use crate::error::{Error, Result};

fn check_win32(result: WIN32_ERROR, api_name: &str) -> Result<()> {
    if result.0 == 0 {
        Ok(())
    } else {
        Err(Error::DisplayQuery(format!(
            "{} failed with error code: {}",
            api_name, result.0
        )))
    }
}

/// Layout of `DISPLAYCONFIG_GET_ADVANCED_COLOR_INFO`, declared by hand so the
/// bitfield union is read as a plain `u32`.
#[repr(C)]
struct AdvancedColorQuery {
    header: DISPLAYCONFIG_DEVICE_INFO_HEADER,
    value: u32,
    color_encoding: u32,
    bits_per_color_channel: u32,
}

/// Layout of `DISPLAYCONFIG_SET_ADVANCED_COLOR_STATE`; bit 0 of `value` is
/// `enableAdvancedColor`.
#[repr(C)]
struct AdvancedColorState {
    header: DISPLAYCONFIG_DEVICE_INFO_HEADER,
    value: u32,
}

fn hwnd(output: OutputHandle) -> HWND {
    HWND(output.0 as *mut core::ffi::c_void)
}

fn monitor_from_output(output: OutputHandle) -> Result<HMONITOR> {
    // SAFETY: MonitorFromWindow accepts any handle value and returns null
    // for MONITOR_DEFAULTTONULL when the window is on no monitor.
    let monitor = unsafe { MonitorFromWindow(hwnd(output), MONITOR_DEFAULTTONULL) };
    if monitor.is_invalid() {
        return Err(Error::DisplayQuery("output window is not on any monitor".into()));
    }
    Ok(monitor)
}

fn monitor_device_name(monitor: HMONITOR) -> Option<[u16; 32]> {
    // SAFETY: GetMonitorInfoW writes to a caller-provided MONITORINFOEXW.
    // cbSize must be set correctly before the call.
    unsafe {
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;
        if !GetMonitorInfoW(monitor, &mut info.monitorInfo).as_bool() {
            return None;
        }
        Some(info.szDevice)
    }
}

fn active_paths() -> Result<Vec<DISPLAYCONFIG_PATH_INFO>> {
    let mut path_count = 0u32;
    let mut mode_count = 0u32;

    // SAFETY: both calls write into caller-owned buffers sized from the
    // counts returned by GetDisplayConfigBufferSizes.
    unsafe {
        check_win32(
            GetDisplayConfigBufferSizes(QDC_ONLY_ACTIVE_PATHS, &mut path_count, &mut mode_count),
            "GetDisplayConfigBufferSizes",
        )?;

        let mut paths = vec![DISPLAYCONFIG_PATH_INFO::default(); path_count as usize];
        let mut modes = vec![DISPLAYCONFIG_MODE_INFO::default(); mode_count as usize];
        check_win32(
            QueryDisplayConfig(
                QDC_ONLY_ACTIVE_PATHS,
                &mut path_count,
                paths.as_mut_ptr(),
                &mut mode_count,
                modes.as_mut_ptr(),
                None,
            ),
            "QueryDisplayConfig",
        )?;
        paths.truncate(path_count as usize);
        Ok(paths)
    }
}

fn source_device_name(path: &DISPLAYCONFIG_PATH_INFO) -> Option<[u16; 32]> {
    let mut source_name = DISPLAYCONFIG_SOURCE_DEVICE_NAME {
        header: DISPLAYCONFIG_DEVICE_INFO_HEADER {
            r#type: DISPLAYCONFIG_DEVICE_INFO_GET_SOURCE_NAME,
            size: std::mem::size_of::<DISPLAYCONFIG_SOURCE_DEVICE_NAME>() as u32,
            adapterId: path.sourceInfo.adapterId,
            id: path.sourceInfo.id,
        },
        ..Default::default()
    };

    // SAFETY: header.size and header.type describe the struct passed in.
    if unsafe { DisplayConfigGetDeviceInfo(&mut source_name.header) } != 0 {
        return None;
    }
    Some(source_name.viewGdiDeviceName)
}

fn path_for_monitor(monitor: HMONITOR) -> Result<DISPLAYCONFIG_PATH_INFO> {
    let device_name = monitor_device_name(monitor)
        .ok_or_else(|| Error::DisplayQuery("GetMonitorInfoW failed".into()))?;

    active_paths()?
        .into_iter()
        .find(|path| source_device_name(path) == Some(device_name))
        .ok_or_else(|| Error::DisplayQuery("no display path found for monitor".into()))
}

fn query_advanced_color(path: &DISPLAYCONFIG_PATH_INFO) -> Result<AdvancedColorInfo> {
    let mut query = AdvancedColorQuery {
        header: DISPLAYCONFIG_DEVICE_INFO_HEADER {
            r#type: DISPLAYCONFIG_DEVICE_INFO_GET_ADVANCED_COLOR_INFO,
            size: std::mem::size_of::<AdvancedColorQuery>() as u32,
            adapterId: path.targetInfo.adapterId,
            id: path.targetInfo.id,
        },
        value: 0,
        color_encoding: 0,
        bits_per_color_channel: 0,
    };

    // SAFETY: AdvancedColorQuery matches the C layout announced in header.size.
    let ret = unsafe { DisplayConfigGetDeviceInfo(&mut query.header) };
    if ret != 0 {
        return Err(Error::DisplayQuery(format!(
            "DisplayConfigGetDeviceInfo(ADVANCED_COLOR_INFO) failed: {}",
            ret
        )));
    }
    Ok(AdvancedColorInfo::from_bits(
        query.value,
        query.bits_per_color_channel,
    ))
}

fn dxgi_max_luminance(monitor: HMONITOR) -> Result<f32> {
    let backend = |e: windows::core::Error| Error::DisplayQuery(e.to_string());

    // SAFETY: plain DXGI enumeration; every COM object is owned by this scope.
    unsafe {
        let factory: IDXGIFactory1 = CreateDXGIFactory1().map_err(backend)?;
        let mut adapter_index = 0;
        while let Ok(adapter) = factory.EnumAdapters1(adapter_index) {
            let mut output_index = 0;
            while let Ok(output) = adapter.EnumOutputs(output_index) {
                if let Ok(output6) = output.cast::<IDXGIOutput6>() {
                    let desc = output6.GetDesc1().map_err(backend)?;
                    if desc.Monitor == monitor {
                        return Ok(desc.MaxLuminance);
                    }
                }
                output_index += 1;
            }
            adapter_index += 1;
        }
    }

    Err(Error::DisplayQuery("no DXGI output found for monitor".into()))
}

struct RawMonitor {
    handle: HMONITOR,
    device_name: [u16; 32],
    is_primary: bool,
    width: u32,
    height: u32,
}

unsafe extern "system" fn enum_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<RawMonitor>);

    let mut info = MONITORINFOEXW {
        monitorInfo: MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFOEXW>() as u32,
            ..Default::default()
        },
        ..Default::default()
    };

    if GetMonitorInfoW(hmonitor, &mut info.monitorInfo).as_bool() {
        let rect = info.monitorInfo.rcMonitor;
        monitors.push(RawMonitor {
            handle: hmonitor,
            device_name: info.szDevice,
            is_primary: (info.monitorInfo.dwFlags & 1) != 0, // MONITORINFOF_PRIMARY
            width: (rect.right - rect.left) as u32,
            height: (rect.bottom - rect.top) as u32,
        });
    }

    BOOL(1)
}

/// DisplayConfig/DXGI backed [`DisplayColorApi`].
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsDisplay;

impl DisplayColorApi for WindowsDisplay {
    fn advanced_color_info(&self, output: OutputHandle) -> Result<AdvancedColorInfo> {
        let path = path_for_monitor(monitor_from_output(output)?)?;
        query_advanced_color(&path)
    }

    fn set_advanced_color_enabled(&self, output: OutputHandle, enabled: bool) -> Result<()> {
        let path = path_for_monitor(monitor_from_output(output)?)?;
        let state = AdvancedColorState {
            header: DISPLAYCONFIG_DEVICE_INFO_HEADER {
                r#type: DISPLAYCONFIG_DEVICE_INFO_SET_ADVANCED_COLOR_STATE,
                size: std::mem::size_of::<AdvancedColorState>() as u32,
                adapterId: path.targetInfo.adapterId,
                id: path.targetInfo.id,
            },
            value: enabled as u32,
        };

        // SAFETY: AdvancedColorState matches the C layout announced in header.size.
        let ret = unsafe { DisplayConfigSetDeviceInfo(&state.header) };
        if ret != 0 {
            return Err(Error::DisplayQuery(format!(
                "DisplayConfigSetDeviceInfo(SET_ADVANCED_COLOR_STATE) failed: {}",
                ret
            )));
        }
        Ok(())
    }

    fn max_luminance(&self, output: OutputHandle) -> Result<f32> {
        dxgi_max_luminance(monitor_from_output(output)?)
    }

    fn enumerate_monitors(&self) -> Result<Vec<MonitorInfo>> {
        let mut raw: Vec<RawMonitor> = Vec::new();
        // SAFETY: the callback runs synchronously on this thread and `raw`
        // outlives the call.
        unsafe {
            let _ = EnumDisplayMonitors(
                Some(HDC::default()),
                None,
                Some(enum_proc),
                LPARAM(&mut raw as *mut Vec<RawMonitor> as isize),
            );
        }
        if raw.is_empty() {
            return Err(Error::DisplayQuery(
                "No monitors detected via EnumDisplayMonitors".into(),
            ));
        }

        let paths = active_paths()?;
        let monitors = raw
            .into_iter()
            .map(|mon| {
                let color = paths
                    .iter()
                    .find(|path| source_device_name(path) == Some(mon.device_name))
                    .and_then(|path| query_advanced_color(path).ok())
                    .unwrap_or_default();
                MonitorInfo {
                    name: String::from_utf16_lossy(&mon.device_name)
                        .trim_end_matches('\0')
                        .to_string(),
                    is_primary: mon.is_primary,
                    width: mon.width,
                    height: mon.height,
                    color,
                    max_luminance: dxgi_max_luminance(mon.handle).ok(),
                }
            })
            .collect();
        Ok(monitors)
    }
}

/// Loaded-module probe for the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsHost;

impl HostEnvironment for WindowsHost {
    fn is_module_loaded(&self, name: &str) -> bool {
        // SAFETY: GetModuleHandleW does not change the module refcount.
        unsafe { GetModuleHandleW(&HSTRING::from(name)).is_ok() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_monitors_returns_results() {
        let monitors = WindowsDisplay
            .enumerate_monitors()
            .expect("enumerate_monitors should succeed");
        assert!(!monitors.is_empty(), "Should detect at least one monitor");
        assert_eq!(monitors.iter().filter(|m| m.is_primary).count(), 1);
    }

    #[test]
    fn test_module_probe() {
        assert!(WindowsHost.is_module_loaded("kernel32.dll"));
        assert!(!WindowsHost.is_module_loaded("definitely_not_loaded_4711.dll"));
    }
}
