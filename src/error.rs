use thiserror::Error;

/// Failures the blanking core absorbs instead of propagating.
///
/// None of these stop the process: each is logged, forwarded to the
/// notification sink, and the core carries on with a safe fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SentinelError {
    /// An idle-time or playback query failed. Idle degrades to "not idle
    /// enough", playback degrades to "not playing".
    #[error("{sensor} sensor unavailable: {reason}")]
    SensorUnavailable { sensor: &'static str, reason: String },

    /// A monitor's overlay surface could not be created. The monitor is
    /// skipped; surfaces already created on other monitors stay up.
    #[error("overlay creation failed on monitor {index}: {reason}")]
    OverlayCreationFailed { index: usize, reason: String },

    /// Display enumeration found nothing. Blanking still activates, on zero
    /// monitors.
    #[error("no monitors found")]
    EnumerationEmpty,
}
