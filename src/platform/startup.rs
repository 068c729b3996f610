//! Run-at-logon registration under `HKCU\...\Run`.

use std::ffi::c_void;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};
use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
use windows::Win32::System::Registry::{
    HKEY_CURRENT_USER, REG_SZ, RegDeleteKeyValueW, RegSetKeyValueW,
};
use windows::core::{PCWSTR, w};

const RUN_KEY: PCWSTR = w!("Software\\Microsoft\\Windows\\CurrentVersion\\Run");
const VALUE_NAME: PCWSTR = w!("OLED Sentinel");

/// Make the Run entry match `enabled`. `config` is forwarded as `--config`
/// when the daemon was started with an explicit config path.
pub fn sync_startup_registration(enabled: bool, config: Option<&Path>) -> Result<()> {
    if !enabled {
        let status = unsafe { RegDeleteKeyValueW(HKEY_CURRENT_USER, RUN_KEY, VALUE_NAME) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(());
        }
        status.ok().context("Failed to remove startup entry")?;
        info!("Startup registration removed");
        return Ok(());
    }

    let exe = std::env::current_exe().context("Failed to locate executable")?;
    let mut command = format!("\"{}\"", exe.display());
    if let Some(path) = config {
        command.push_str(&format!(" --config \"{}\"", path.display()));
    }
    debug!("Startup command: {}", command);

    let wide: Vec<u16> = command.encode_utf16().chain(std::iter::once(0)).collect();
    unsafe {
        RegSetKeyValueW(
            HKEY_CURRENT_USER,
            RUN_KEY,
            VALUE_NAME,
            REG_SZ.0,
            Some(wide.as_ptr() as *const c_void),
            (wide.len() * std::mem::size_of::<u16>()) as u32,
        )
    }
    .ok()
    .context("Failed to write startup entry")?;

    info!("Startup registration enabled");
    Ok(())
}
