//! Notification-area icon reflecting the blanking state.

use anyhow::Result;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFYICONDATAW,
    Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{IDI_APPLICATION, IDI_SHIELD, LoadIconW, WM_APP};

use crate::error::SentinelError;
use crate::notify::{LogSink, NotificationSink, StateChanged};

/// Posted to the controller window for mouse activity on the icon.
/// The low word of `LPARAM` carries the mouse message.
pub const WM_TRAY_CALLBACK: u32 = WM_APP + 2;

const TRAY_ID: u32 = 1;

/// The icon owned by the controller window.
#[derive(Clone, Copy, Debug)]
pub struct TrayIcon {
    hwnd: HWND,
}

impl TrayIcon {
    pub fn new(hwnd: HWND) -> Self {
        Self { hwnd }
    }

    /// Add the icon; also used to restore it after Explorer restarts.
    pub fn add(&self, active: bool) -> Result<()> {
        let nid = self.data(active)?;
        if !unsafe { Shell_NotifyIconW(NIM_ADD, &nid) }.as_bool() {
            anyhow::bail!("Shell_NotifyIconW(NIM_ADD) failed");
        }
        Ok(())
    }

    pub fn update(&self, active: bool) -> Result<()> {
        let nid = self.data(active)?;
        if !unsafe { Shell_NotifyIconW(NIM_MODIFY, &nid) }.as_bool() {
            anyhow::bail!("Shell_NotifyIconW(NIM_MODIFY) failed");
        }
        Ok(())
    }

    pub fn remove(&self) {
        let nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: self.hwnd,
            uID: TRAY_ID,
            ..Default::default()
        };
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
        }
    }

    fn data(&self, active: bool) -> Result<NOTIFYICONDATAW> {
        let icon = unsafe { LoadIconW(None, if active { IDI_SHIELD } else { IDI_APPLICATION }) }?;

        let mut nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: self.hwnd,
            uID: TRAY_ID,
            uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
            uCallbackMessage: WM_TRAY_CALLBACK,
            hIcon: icon,
            ..Default::default()
        };

        let tip = if active {
            "OLED Sentinel - Blanking"
        } else {
            "OLED Sentinel - Watching"
        };
        for (dst, src) in nid.szTip.iter_mut().zip(tip.encode_utf16()) {
            *dst = src;
        }
        Ok(nid)
    }
}

/// Sink that logs and keeps the tray icon in step with the blanking state.
pub struct TraySink {
    tray: TrayIcon,
    log: LogSink,
}

impl TraySink {
    pub fn new(tray: TrayIcon) -> Self {
        Self {
            tray,
            log: LogSink,
        }
    }
}

impl NotificationSink for TraySink {
    fn state_changed(&mut self, event: &StateChanged) {
        self.log.state_changed(event);
        if let Err(e) = self.tray.update(event.active) {
            tracing::warn!("Failed to update tray icon: {:#}", e);
        }
    }

    fn diagnostic(&mut self, error: &SentinelError) {
        self.log.diagnostic(error);
    }
}
