use std::time::{Duration, Instant};

use crate::activity::ActivitySample;

/// How the current blanking period started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// The idle timeout expired.
    Automatic,
    /// The user asked for it.
    Manual,
}

/// Where the state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not blanking, no overlays.
    Idle,
    /// Overlays up since `since`.
    Active { mode: ActivationMode, since: Instant },
}

impl Phase {
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Active { .. })
    }

    pub fn mode(self) -> Option<ActivationMode> {
        match self {
            Phase::Idle => None,
            Phase::Active { mode, .. } => Some(mode),
        }
    }
}

/// Why blanking ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationReason {
    /// The idle counter dropped: the user is back.
    InputResumed,
    /// Playback started keeping the display on.
    Playback,
    /// Input on an overlay surface.
    OverlayInput,
    /// Explicit wake request (tray click or menu).
    ManualRequest,
    /// Monitor topology changed.
    DisplayChange,
    /// Process is exiting.
    Shutdown,
}

/// Mutable state owned by the blanking machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankingState {
    pub phase: Phase,
    pub cursor_hidden: bool,
}

impl Default for BlankingState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            cursor_hidden: false,
        }
    }
}

/// Timing parameters of the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankingTiming {
    /// Inactivity required before automatic blanking.
    pub idle_timeout: Duration,
    /// After a manual activation, input is ignored for this long.
    pub manual_cooldown: Duration,
    /// Once the cooldown is over, a manual blank clears when the idle
    /// counter is below this.
    pub fresh_input: Duration,
}

impl Default for BlankingTiming {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(300),
            manual_cooldown: Duration::from_millis(2500),
            fresh_input: Duration::from_secs(2),
        }
    }
}

impl BlankingTiming {
    /// Whether a manual activation at `since` is still protected at `now`.
    pub fn in_cooldown(&self, since: Instant, now: Instant) -> bool {
        now.saturating_duration_since(since) < self.manual_cooldown
    }
}

/// Outcome of one tick's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Stay,
    Activate,
    Deactivate(DeactivationReason),
}

/// Decide what a tick should do, given the current phase and a fresh sample.
///
/// * `Idle`: activate once idle time exceeds the timeout, unless playback
///   suppresses it.
/// * `Active` (automatic): deactivate on playback or as soon as idle time is
///   back within the timeout.
/// * `Active` (manual): hold through the cooldown no matter what, then clear
///   only on fresh input made after the activation.
pub fn evaluate(
    phase: Phase,
    sample: &ActivitySample,
    now: Instant,
    timing: &BlankingTiming,
) -> Verdict {
    match phase {
        Phase::Idle => {
            if !sample.playback_active && sample.idle > timing.idle_timeout {
                Verdict::Activate
            } else {
                Verdict::Stay
            }
        }
        Phase::Active {
            mode: ActivationMode::Automatic,
            ..
        } => {
            if sample.playback_active {
                Verdict::Deactivate(DeactivationReason::Playback)
            } else if sample.idle <= timing.idle_timeout {
                Verdict::Deactivate(DeactivationReason::InputResumed)
            } else {
                Verdict::Stay
            }
        }
        Phase::Active {
            mode: ActivationMode::Manual,
            since,
        } => {
            // Input counts only if it happened after the activation, so
            // the triggering click never clears the blank.
            let input_since_activation = sample.idle < now.saturating_duration_since(since);
            if timing.in_cooldown(since, now) {
                Verdict::Stay
            } else if sample.idle < timing.fresh_input && input_since_activation {
                Verdict::Deactivate(DeactivationReason::InputResumed)
            } else {
                Verdict::Stay
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(idle_secs: u64, playback_active: bool) -> ActivitySample {
        ActivitySample {
            idle: Duration::from_secs(idle_secs),
            playback_active,
        }
    }

    fn sample_ms(idle_ms: u64) -> ActivitySample {
        ActivitySample {
            idle: Duration::from_millis(idle_ms),
            playback_active: false,
        }
    }

    #[test]
    fn test_idle_activates_only_past_timeout() {
        let timing = BlankingTiming::default();
        let now = Instant::now();

        assert_eq!(
            evaluate(Phase::Idle, &sample(299, false), now, &timing),
            Verdict::Stay
        );
        assert_eq!(
            evaluate(Phase::Idle, &sample(300, false), now, &timing),
            Verdict::Stay
        );
        assert_eq!(
            evaluate(Phase::Idle, &sample(301, false), now, &timing),
            Verdict::Activate
        );
    }

    #[test]
    fn test_playback_suppresses_activation() {
        let timing = BlankingTiming::default();
        let now = Instant::now();
        for idle in [0, 301, 10_000] {
            assert_eq!(
                evaluate(Phase::Idle, &sample(idle, true), now, &timing),
                Verdict::Stay
            );
        }
    }

    #[test]
    fn test_automatic_deactivates_on_playback_regardless_of_idle() {
        let timing = BlankingTiming::default();
        let now = Instant::now();
        let phase = Phase::Active {
            mode: ActivationMode::Automatic,
            since: now,
        };
        for idle in [0, 301, 10_000] {
            assert_eq!(
                evaluate(phase, &sample(idle, true), now, &timing),
                Verdict::Deactivate(DeactivationReason::Playback)
            );
        }
    }

    #[test]
    fn test_automatic_deactivates_on_input() {
        let timing = BlankingTiming::default();
        let now = Instant::now();
        let phase = Phase::Active {
            mode: ActivationMode::Automatic,
            since: now,
        };
        assert_eq!(
            evaluate(phase, &sample(400, false), now, &timing),
            Verdict::Stay
        );
        assert_eq!(
            evaluate(phase, &sample(300, false), now, &timing),
            Verdict::Deactivate(DeactivationReason::InputResumed)
        );
    }

    #[test]
    fn test_manual_holds_through_cooldown() {
        let timing = BlankingTiming::default();
        let t0 = Instant::now();
        let phase = Phase::Active {
            mode: ActivationMode::Manual,
            since: t0,
        };

        for ms in (0..2500).step_by(250) {
            let now = t0 + Duration::from_millis(ms);
            assert_eq!(evaluate(phase, &sample_ms(0), now, &timing), Verdict::Stay);
            assert_eq!(
                evaluate(phase, &sample(0, true), now, &timing),
                Verdict::Stay
            );
        }
    }

    #[test]
    fn test_manual_needs_fresh_input_after_cooldown() {
        let timing = BlankingTiming::default();
        let t0 = Instant::now();
        let phase = Phase::Active {
            mode: ActivationMode::Manual,
            since: t0,
        };
        let after = t0 + Duration::from_millis(2500);

        // Cooldown over, but nobody touched anything.
        assert_eq!(
            evaluate(phase, &sample_ms(2000), after, &timing),
            Verdict::Stay
        );
        assert_eq!(
            evaluate(phase, &sample(900, false), after, &timing),
            Verdict::Stay
        );
        assert_eq!(
            evaluate(phase, &sample_ms(1999), after, &timing),
            Verdict::Deactivate(DeactivationReason::InputResumed)
        );
    }

    #[test]
    fn test_manual_ignores_activation_input_with_long_fresh_window() {
        let timing = BlankingTiming {
            fresh_input: Duration::from_secs(5),
            ..BlankingTiming::default()
        };
        let t0 = Instant::now();
        let phase = Phase::Active {
            mode: ActivationMode::Manual,
            since: t0,
        };
        let now = t0 + Duration::from_millis(2600);

        // Last input was the click that started the blank.
        assert_eq!(evaluate(phase, &sample_ms(2600), now, &timing), Verdict::Stay);
        assert_eq!(evaluate(phase, &sample_ms(2700), now, &timing), Verdict::Stay);
        assert_eq!(
            evaluate(phase, &sample_ms(2599), now, &timing),
            Verdict::Deactivate(DeactivationReason::InputResumed)
        );
    }

    #[test]
    fn test_phase_helpers() {
        let now = Instant::now();
        assert!(!Phase::Idle.is_active());
        assert_eq!(Phase::Idle.mode(), None);
        let active = Phase::Active {
            mode: ActivationMode::Manual,
            since: now,
        };
        assert!(active.is_active());
        assert_eq!(active.mode(), Some(ActivationMode::Manual));
    }
}
