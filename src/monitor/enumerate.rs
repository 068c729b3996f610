use windows::Win32::Foundation::{LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW, MONITORINFOF_PRIMARY,
};

use super::registry::DisplayEnumerator;
use super::types::MonitorInfo;

/// [`DisplayEnumerator`] backed by the Win32 display APIs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Win32Displays;

impl DisplayEnumerator for Win32Displays {
    fn enumerate(&self) -> Vec<MonitorInfo> {
        enumerate_monitors()
    }
}

/// Enumerate all monitors currently connected to the system.
///
/// Uses the Win32 `EnumDisplayMonitors` API to walk every active display and
/// collects geometry + device-name information into a [`Vec<MonitorInfo>`].
/// A failed enumeration yields an empty list.
pub fn enumerate_monitors() -> Vec<MonitorInfo> {
    unsafe extern "system" fn enum_proc(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _rect: *mut RECT,
        lparam: LPARAM,
    ) -> windows::core::BOOL {
        unsafe {
            let monitors = &mut *(lparam.0 as *mut Vec<MonitorInfo>);

            let mut info = MONITORINFOEXW::default();
            info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

            if GetMonitorInfoW(hmonitor, &mut info as *mut _ as *mut _).as_bool() {
                let rc = info.monitorInfo.rcMonitor;
                let device_name_slice = &info.szDevice;
                let name_len = device_name_slice
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(device_name_slice.len());

                monitors.push(MonitorInfo {
                    name: String::from_utf16_lossy(&device_name_slice[..name_len]),
                    x: rc.left,
                    y: rc.top,
                    width: rc.right - rc.left,
                    height: rc.bottom - rc.top,
                    primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
                    hmonitor: hmonitor.0 as isize,
                });
            }

            windows::core::BOOL(1) // continue enumeration
        }
    }

    let mut monitors: Vec<MonitorInfo> = Vec::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(enum_proc),
            LPARAM(&mut monitors as *mut Vec<MonitorInfo> as isize),
        )
    };

    if !ok.as_bool() {
        tracing::warn!("EnumDisplayMonitors failed");
        return Vec::new();
    }
    monitors
}
