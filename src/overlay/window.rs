use std::sync::atomic::{AtomicIsize, AtomicU16, Ordering};

use anyhow::{Context, Result};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateSolidBrush, DeleteObject, EndPaint, FillRect, HBRUSH, HGDIOBJ, PAINTSTRUCT,
    UpdateWindow,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW, DestroyWindow, HWND_TOPMOST,
    PostMessageW, RegisterClassW, SW_SHOW, SWP_SHOWWINDOW, SetCursor, SetForegroundWindow,
    SetWindowPos, ShowCursor, ShowWindow, WM_APP, WM_ERASEBKGND, WM_KEYDOWN, WM_LBUTTONDOWN,
    WM_MBUTTONDOWN, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_PAINT, WM_RBUTTONDOWN, WM_SETCURSOR,
    WM_SYSKEYDOWN, WM_XBUTTONDOWN, WNDCLASSW, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
};
use windows::core::{PCWSTR, w};

use super::config::OverlayConfig;
use super::manager::SurfaceBackend;

/// Posted to the controller window when a surface sees input.
/// `WPARAM` carries the surface's `HWND`.
pub const WM_OVERLAY_INPUT: u32 = WM_APP + 1;

const CLASS_NAME: PCWSTR = w!("OLEDSentinelOverlay");

/// Window class atom, registered once and reused by every surface.
static WINDOW_CLASS_ATOM: AtomicU16 = AtomicU16::new(0);

/// Controller window that receives [`WM_OVERLAY_INPUT`].
static INPUT_TARGET: AtomicIsize = AtomicIsize::new(0);

// ─── Window procedure ───────────────────────────────────────────────────────

/// Window procedure callback for blanking surfaces.
///
/// * `WM_PAINT`: fills the window with solid black.
/// * `WM_SETCURSOR`: keeps the pointer invisible over the surface.
/// * mouse and keys: forwarded to the controller as [`WM_OVERLAY_INPUT`].
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe {
        match msg {
            WM_PAINT => {
                let mut ps = PAINTSTRUCT::default();
                let hdc = BeginPaint(hwnd, &mut ps);
                if !hdc.is_invalid() {
                    let brush = CreateSolidBrush(COLORREF(0x00000000));
                    if !brush.is_invalid() {
                        let _ = FillRect(hdc, &ps.rcPaint, brush);
                        let _ = DeleteObject(HGDIOBJ(brush.0));
                    }
                    let _ = EndPaint(hwnd, &ps);
                }
                LRESULT(0)
            }
            WM_ERASEBKGND => LRESULT(1),
            WM_SETCURSOR => {
                SetCursor(None);
                LRESULT(1)
            }
            WM_MOUSEMOVE | WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN | WM_XBUTTONDOWN
            | WM_MOUSEWHEEL | WM_KEYDOWN | WM_SYSKEYDOWN => {
                let target = INPUT_TARGET.load(Ordering::Relaxed);
                if target != 0 {
                    let _ = PostMessageW(
                        Some(HWND(target as *mut _)),
                        WM_OVERLAY_INPUT,
                        WPARAM(hwnd.0 as usize),
                        LPARAM(0),
                    );
                }
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}

// ─── Class registration ─────────────────────────────────────────────────────

/// Register the `OLEDSentinelOverlay` window class.
///
/// Only the first call registers; later calls return immediately.
pub fn register_overlay_class() -> Result<()> {
    if WINDOW_CLASS_ATOM.load(Ordering::Relaxed) != 0 {
        return Ok(());
    }

    let hinstance: HINSTANCE = unsafe { GetModuleHandleW(None) }
        .context("GetModuleHandleW failed")?
        .into();

    let wc = WNDCLASSW {
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        lpszClassName: CLASS_NAME,
        style: CS_HREDRAW | CS_VREDRAW,
        hbrBackground: HBRUSH(std::ptr::null_mut()),
        ..Default::default()
    };

    let atom = unsafe { RegisterClassW(&wc) };
    if atom == 0 {
        anyhow::bail!("Failed to register overlay window class");
    }

    WINDOW_CLASS_ATOM.store(atom, Ordering::Relaxed);
    Ok(())
}

// ─── Surface backend ────────────────────────────────────────────────────────

/// Win32 surface backend: one top-most black popup per monitor, created and
/// destroyed on the thread that runs the controller's message loop.
pub struct Win32Surfaces {
    cursor_hidden: bool,
}

impl Win32Surfaces {
    /// `controller` receives [`WM_OVERLAY_INPUT`] for every surface.
    pub fn new(controller: HWND) -> Result<Self> {
        register_overlay_class()?;
        INPUT_TARGET.store(controller.0 as isize, Ordering::Relaxed);
        Ok(Self {
            cursor_hidden: false,
        })
    }
}

impl SurfaceBackend for Win32Surfaces {
    type Handle = isize;

    /// The window is:
    /// * A borderless popup (`WS_POPUP`) covering the monitor rectangle.
    /// * Always on top (`WS_EX_TOPMOST`).
    /// * Hidden from the taskbar (`WS_EX_TOOLWINDOW`).
    /// * Input-observing, so the first real keypress or click ends blanking.
    fn create(&mut self, config: &OverlayConfig) -> Result<isize> {
        unsafe {
            let hinstance: HINSTANCE = GetModuleHandleW(None)
                .context("GetModuleHandleW failed")?
                .into();

            let hwnd = CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                CLASS_NAME,
                w!("OLED Sentinel"),
                WS_POPUP,
                config.x,
                config.y,
                config.width,
                config.height,
                None,
                None,
                Some(hinstance),
                None,
            )
            .context("CreateWindowExW failed")?;

            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = SetWindowPos(
                hwnd,
                Some(HWND_TOPMOST),
                config.x,
                config.y,
                config.width,
                config.height,
                SWP_SHOWWINDOW,
            );
            let _ = SetForegroundWindow(hwnd);
            let _ = UpdateWindow(hwnd);

            Ok(hwnd.0 as isize)
        }
    }

    fn destroy(&mut self, handle: isize) {
        unsafe {
            if let Err(e) = DestroyWindow(HWND(handle as *mut _)) {
                tracing::warn!("DestroyWindow failed: {}", e);
            }
        }
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        // ShowCursor keeps a per-thread display counter; only move it once
        // per state change so it stays balanced.
        if self.cursor_hidden == !visible {
            return;
        }
        unsafe {
            ShowCursor(visible);
        }
        self.cursor_hidden = !visible;
    }
}
