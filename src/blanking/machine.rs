use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::activity::ActivitySample;
use crate::monitor::MonitorDescriptor;
use crate::notify::{NotificationSink, StateChanged};
use crate::overlay::{InputVerdict, OverlayManager, SurfaceBackend};

use super::state::{
    ActivationMode, BlankingState, BlankingTiming, DeactivationReason, Phase, Verdict, evaluate,
};

/// Applies the transition rules: owns the blanking state and the overlays,
/// and is the only thing that mutates either.
pub struct BlankingMachine<B: SurfaceBackend> {
    state: BlankingState,
    timing: BlankingTiming,
    overlays: OverlayManager<B>,
}

impl<B: SurfaceBackend> BlankingMachine<B> {
    pub fn new(backend: B, timing: BlankingTiming, input_grace: Duration) -> Self {
        Self {
            state: BlankingState::default(),
            timing,
            overlays: OverlayManager::new(backend, input_grace),
        }
    }

    pub fn state(&self) -> BlankingState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_active(&self) -> bool {
        self.state.phase.is_active()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.active_count()
    }

    pub fn overlays(&self) -> &OverlayManager<B> {
        &self.overlays
    }

    pub fn timing(&self) -> BlankingTiming {
        self.timing
    }

    pub fn set_timing(&mut self, timing: BlankingTiming, input_grace: Duration) {
        self.timing = timing;
        self.overlays.set_grace(input_grace);
    }

    /// Evaluate one tick and apply the verdict.
    pub fn tick(
        &mut self,
        sample: &ActivitySample,
        now: Instant,
        monitors: &[MonitorDescriptor],
        sink: &mut dyn NotificationSink,
    ) -> Verdict {
        let verdict = evaluate(self.state.phase, sample, now, &self.timing);
        match verdict {
            Verdict::Stay => {}
            Verdict::Activate => self.activate(ActivationMode::Automatic, now, monitors, sink),
            Verdict::Deactivate(reason) => self.deactivate(reason, sink),
        }
        verdict
    }

    /// User asked to blank now. Only honoured while idle.
    pub fn request_activation(
        &mut self,
        now: Instant,
        monitors: &[MonitorDescriptor],
        sink: &mut dyn NotificationSink,
    ) -> bool {
        if self.is_active() {
            debug!("Manual activation ignored: already blanking");
            return false;
        }
        self.activate(ActivationMode::Manual, now, monitors, sink);
        true
    }

    /// User asked to wake the displays. Bypasses the manual cooldown.
    pub fn request_deactivation(&mut self, sink: &mut dyn NotificationSink) -> bool {
        self.force_idle(DeactivationReason::ManualRequest, sink)
    }

    /// Input arrived on surface `handle`.
    ///
    /// Ends an automatic blank straight away; a manual blank only once its
    /// cooldown is over, so the triggering click cannot cancel it.
    pub fn overlay_input(
        &mut self,
        handle: B::Handle,
        now: Instant,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        if self.overlays.input_event(handle, now) == InputVerdict::Ignored {
            return false;
        }

        match self.state.phase {
            Phase::Idle => false,
            Phase::Active {
                mode: ActivationMode::Manual,
                since,
            } if self.timing.in_cooldown(since, now) => {
                debug!("Overlay input ignored during manual cooldown");
                false
            }
            Phase::Active { .. } => {
                self.deactivate(DeactivationReason::OverlayInput, sink);
                true
            }
        }
    }

    /// Tear everything down unconditionally (display change, shutdown,
    /// explicit wake). Returns whether anything was active.
    pub fn force_idle(
        &mut self,
        reason: DeactivationReason,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        if !self.is_active() {
            // Nothing to notify, but never leave a surface behind.
            self.overlays.hide();
            self.restore_cursor();
            return false;
        }
        self.deactivate(reason, sink);
        true
    }

    /// Rebuild the surfaces for a new set of enabled monitors, keeping the
    /// current phase. Does nothing while idle.
    pub fn refresh_surfaces(
        &mut self,
        monitors: &[MonitorDescriptor],
        now: Instant,
        sink: &mut dyn NotificationSink,
    ) {
        if !self.is_active() {
            return;
        }
        self.overlays.hide();
        let outcome = self.overlays.show(monitors, now);
        for failure in &outcome.failures {
            sink.diagnostic(failure);
        }
        debug!("Surfaces rebuilt on {} monitor(s)", outcome.created);
    }

    fn activate(
        &mut self,
        mode: ActivationMode,
        now: Instant,
        monitors: &[MonitorDescriptor],
        sink: &mut dyn NotificationSink,
    ) {
        let outcome = self.overlays.show(monitors, now);
        for failure in &outcome.failures {
            sink.diagnostic(failure);
        }

        self.overlays.set_cursor_visible(false);
        self.state = BlankingState {
            phase: Phase::Active { mode, since: now },
            cursor_hidden: true,
        };

        info!(
            "Blanking {} monitor(s) ({:?})",
            self.overlays.active_count(),
            mode
        );
        sink.state_changed(&StateChanged {
            active: true,
            mode: Some(mode),
            reason: None,
            overlays: self.overlays.active_count(),
        });
    }

    fn deactivate(&mut self, reason: DeactivationReason, sink: &mut dyn NotificationSink) {
        self.overlays.hide();
        self.restore_cursor();
        self.state.phase = Phase::Idle;

        info!("Blanking ended ({:?})", reason);
        sink.state_changed(&StateChanged {
            active: false,
            mode: None,
            reason: Some(reason),
            overlays: 0,
        });
    }

    fn restore_cursor(&mut self) {
        if self.state.cursor_hidden {
            self.overlays.set_cursor_visible(true);
            self.state.cursor_hidden = false;
        }
    }
}
