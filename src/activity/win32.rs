//! Win32 implementations of the idle clock and playback probes.

use std::ffi::c_void;
use std::time::Duration;

use anyhow::{Context, Result};
use windows::Win32::Media::Audio::Endpoints::IAudioMeterInformation;
use windows::Win32::Media::Audio::{IMMDeviceEnumerator, MMDeviceEnumerator, eConsole, eRender};
use windows::Win32::System::Com::{
    CLSCTX_ALL, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
};
use windows::Win32::System::Power::{
    CallNtPowerInformation, ES_DISPLAY_REQUIRED, EXECUTION_STATE, SystemExecutionState,
};
use windows::Win32::System::SystemInformation::GetTickCount;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};

use super::sensor::{IdleClock, PlaybackProbe};
use crate::config::Config;

/// Idle time from `GetLastInputInfo`, relative to `GetTickCount`.
#[derive(Debug, Default)]
pub struct LastInputClock;

impl IdleClock for LastInputClock {
    fn idle_duration(&self) -> Result<Duration> {
        let mut lii = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };
        unsafe {
            if !GetLastInputInfo(&mut lii).as_bool() {
                anyhow::bail!("GetLastInputInfo failed");
            }
            // Both counters wrap every ~49.7 days.
            let elapsed = GetTickCount().wrapping_sub(lii.dwTime);
            Ok(Duration::from_millis(u64::from(elapsed)))
        }
    }
}

/// Reports playback when some process holds a display-required execution
/// state, which is what video players and browsers request while playing.
#[derive(Debug, Default)]
pub struct ExecutionStateProbe;

impl PlaybackProbe for ExecutionStateProbe {
    fn name(&self) -> &'static str {
        "execution-state"
    }

    fn is_playing(&self) -> Result<bool> {
        let mut state = EXECUTION_STATE(0);
        let status = unsafe {
            CallNtPowerInformation(
                SystemExecutionState,
                None,
                0,
                Some(&mut state as *mut EXECUTION_STATE as *mut c_void),
                std::mem::size_of::<EXECUTION_STATE>() as u32,
            )
        };
        if status.is_err() {
            anyhow::bail!("CallNtPowerInformation failed: {:?}", status);
        }
        Ok(state.0 & ES_DISPLAY_REQUIRED.0 != 0)
    }
}

/// Reports playback when the default render endpoint's peak meter is above
/// a threshold.
pub struct AudioPeakProbe {
    meter: IAudioMeterInformation,
    threshold: f32,
}

impl AudioPeakProbe {
    /// Bind to the default console render device. Must run on the thread
    /// that polls the probe.
    pub fn open(threshold: f32) -> Result<Self> {
        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .context("CoInitializeEx failed")?;

            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .context("Failed to create audio device enumerator")?;
            let device = enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .context("No default audio output device")?;
            let meter: IAudioMeterInformation = device
                .Activate(CLSCTX_ALL, None)
                .context("Failed to activate audio peak meter")?;

            Ok(Self { meter, threshold })
        }
    }
}

impl PlaybackProbe for AudioPeakProbe {
    fn name(&self) -> &'static str {
        "audio-peak"
    }

    fn is_playing(&self) -> Result<bool> {
        let peak = unsafe { self.meter.GetPeakValue() }.context("GetPeakValue failed")?;
        Ok(peak > self.threshold)
    }

    fn apply_config(&mut self, config: &Config) {
        self.threshold = config.audio_peak_threshold;
    }
}
