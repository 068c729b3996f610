use std::fmt::Debug;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, warn};

use crate::error::SentinelError;
use crate::monitor::MonitorDescriptor;
use crate::overlay::config::{OverlayConfig, OverlayState};

/// Platform side of the overlays: creates and destroys the native surfaces
/// and controls the system cursor.
pub trait SurfaceBackend {
    type Handle: Copy + Eq + Debug;

    /// Create an opaque, top-most surface covering `config`'s rectangle.
    fn create(&mut self, config: &OverlayConfig) -> Result<Self::Handle>;

    /// Destroy a surface created by [`create`](Self::create).
    fn destroy(&mut self, handle: Self::Handle);

    fn set_cursor_visible(&mut self, visible: bool);
}

/// Result of [`OverlayManager::show`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShowOutcome {
    /// Surfaces created by this call.
    pub created: usize,
    /// Monitors that were skipped because their surface failed.
    pub failures: Vec<SentinelError>,
}

/// What an input event on a surface means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputVerdict {
    /// Unknown surface, or still inside its grace window.
    Ignored,
    /// Genuine user input: blanking should end.
    Deactivate,
}

/// Controls the lifecycle of the per-monitor blanking surfaces.
///
/// Sits between the blanking state machine (which decides *when* to blank)
/// and the surface backend (which knows *how* to put a black window on a
/// monitor).
pub struct OverlayManager<B: SurfaceBackend> {
    backend: B,
    /// One entry per live surface, in monitor order.
    states: Vec<OverlayState<B::Handle>>,
    /// How long a new surface ignores its own input.
    grace: Duration,
}

impl<B: SurfaceBackend> OverlayManager<B> {
    pub fn new(backend: B, grace: Duration) -> Self {
        Self {
            backend,
            states: Vec::new(),
            grace,
        }
    }

    pub fn set_grace(&mut self, grace: Duration) {
        self.grace = grace;
    }

    /// Create a surface on every monitor that is enabled but does not already
    /// have one.
    ///
    /// A monitor whose surface fails is skipped; the others still come up.
    pub fn show(&mut self, monitors: &[MonitorDescriptor], now: Instant) -> ShowOutcome {
        let mut outcome = ShowOutcome::default();

        for mon in monitors.iter().filter(|m| m.enabled) {
            if self.states.iter().any(|s| s.monitor_index == mon.index) {
                continue;
            }

            let cfg = OverlayConfig::from(mon);
            match self.backend.create(&cfg) {
                Ok(handle) => {
                    debug!("Overlay {:?} up on {}", handle, mon.label());
                    self.states.push(OverlayState {
                        monitor_index: mon.index,
                        handle,
                        created_at: now,
                    });
                    outcome.created += 1;
                }
                Err(e) => {
                    warn!("Skipping {}: {:#}", mon.label(), e);
                    outcome.failures.push(SentinelError::OverlayCreationFailed {
                        index: mon.index,
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        outcome
    }

    /// Destroy every live surface. Does nothing if none exist.
    pub fn hide(&mut self) {
        for state in self.states.drain(..) {
            self.backend.destroy(state.handle);
        }
    }

    /// Classify an input event that arrived on surface `handle`.
    pub fn input_event(&self, handle: B::Handle, now: Instant) -> InputVerdict {
        let Some(state) = self.states.iter().find(|s| s.handle == handle) else {
            return InputVerdict::Ignored;
        };

        if now.saturating_duration_since(state.created_at) < self.grace {
            return InputVerdict::Ignored;
        }
        InputVerdict::Deactivate
    }

    /// Returns the number of surfaces that are currently alive.
    pub fn active_count(&self) -> usize {
        self.states.len()
    }

    /// Monitor indices currently covered, in creation order.
    pub fn covered_monitors(&self) -> impl Iterator<Item = usize> + '_ {
        self.states.iter().map(|s| s.monitor_index)
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.backend.set_cursor_visible(visible);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::monitor::registry::tests::fake_monitor;

    /// What the fake backend has been asked to do.
    #[derive(Debug, Default)]
    pub(crate) struct BackendLog {
        pub live: Vec<u32>,
        pub created: Vec<OverlayConfig>,
        pub cursor_visible: bool,
        pub fail_on: Vec<usize>,
        next: u32,
    }

    /// Surface backend that records calls instead of opening windows.
    #[derive(Clone, Debug)]
    pub(crate) struct FakeSurfaces(pub Rc<RefCell<BackendLog>>);

    impl Default for FakeSurfaces {
        fn default() -> Self {
            Self(Rc::new(RefCell::new(BackendLog {
                cursor_visible: true,
                ..BackendLog::default()
            })))
        }
    }

    impl FakeSurfaces {
        pub(crate) fn live(&self) -> usize {
            self.0.borrow().live.len()
        }

        pub(crate) fn cursor_visible(&self) -> bool {
            self.0.borrow().cursor_visible
        }

        pub(crate) fn fail_on(&self, index: usize) {
            self.0.borrow_mut().fail_on.push(index);
        }
    }

    impl SurfaceBackend for FakeSurfaces {
        type Handle = u32;

        fn create(&mut self, config: &OverlayConfig) -> Result<u32> {
            let mut log = self.0.borrow_mut();
            if log.fail_on.contains(&config.monitor_index) {
                anyhow::bail!("CreateWindowExW failed");
            }
            log.next += 1;
            let handle = log.next;
            log.live.push(handle);
            log.created.push(config.clone());
            Ok(handle)
        }

        fn destroy(&mut self, handle: u32) {
            self.0.borrow_mut().live.retain(|h| *h != handle);
        }

        fn set_cursor_visible(&mut self, visible: bool) {
            self.0.borrow_mut().cursor_visible = visible;
        }
    }

    pub(crate) fn descriptors(enabled: &[bool]) -> Vec<MonitorDescriptor> {
        enabled
            .iter()
            .enumerate()
            .map(|(index, &enabled)| MonitorDescriptor {
                index,
                info: fake_monitor(index),
                enabled,
            })
            .collect()
    }

    const GRACE: Duration = Duration::from_millis(500);

    #[test]
    fn test_show_covers_enabled_monitors_only() {
        let backend = FakeSurfaces::default();
        let mut manager = OverlayManager::new(backend.clone(), GRACE);

        let outcome = manager.show(&descriptors(&[true, false, true]), Instant::now());
        assert_eq!(outcome.created, 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(manager.active_count(), 2);
        assert_eq!(manager.covered_monitors().collect::<Vec<_>>(), vec![0, 2]);

        let log = backend.0.borrow();
        assert_eq!(log.created[1].x, 3840);
        assert_eq!(log.created[1].width, 1920);
    }

    #[test]
    fn test_show_and_hide_for_every_monitor_count() {
        for count in 0..=16 {
            let backend = FakeSurfaces::default();
            let mut manager = OverlayManager::new(backend.clone(), GRACE);

            let outcome = manager.show(&descriptors(&vec![true; count]), Instant::now());
            assert_eq!(outcome.created, count);
            assert_eq!(manager.active_count(), count);
            assert_eq!(backend.live(), count);

            manager.hide();
            assert_eq!(manager.active_count(), 0);
            assert_eq!(backend.live(), 0);
        }
    }

    #[test]
    fn test_overlay_count_matches_enabled_monitors() {
        for count in 0..=16usize {
            // Every other monitor, then every third one disabled.
            for stride in [2, 3] {
                let enabled: Vec<bool> = (0..count).map(|i| i % stride != 0).collect();
                let expected = enabled.iter().filter(|e| **e).count();

                let backend = FakeSurfaces::default();
                let mut manager = OverlayManager::new(backend.clone(), GRACE);
                let outcome = manager.show(&descriptors(&enabled), Instant::now());

                assert_eq!(outcome.created, expected);
                assert_eq!(manager.active_count(), expected);
                assert_eq!(backend.live(), expected);
                assert!(manager.covered_monitors().all(|i| enabled[i]));

                manager.hide();
                assert_eq!(manager.active_count(), 0);
                assert_eq!(backend.live(), 0);
            }
        }
    }

    #[test]
    fn test_show_is_idempotent() {
        let backend = FakeSurfaces::default();
        let mut manager = OverlayManager::new(backend.clone(), GRACE);
        let monitors = descriptors(&[true, true]);

        manager.show(&monitors, Instant::now());
        let outcome = manager.show(&monitors, Instant::now());
        assert_eq!(outcome.created, 0);
        assert_eq!(backend.live(), 2);
    }

    #[test]
    fn test_hide_without_surfaces() {
        let backend = FakeSurfaces::default();
        let mut manager = OverlayManager::new(backend.clone(), GRACE);
        manager.hide();
        manager.hide();
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_failed_surface_is_skipped() {
        let backend = FakeSurfaces::default();
        backend.fail_on(1);
        let mut manager = OverlayManager::new(backend.clone(), GRACE);

        let outcome = manager.show(&descriptors(&[true, true, true]), Instant::now());
        assert_eq!(outcome.created, 2);
        assert_eq!(
            outcome.failures,
            vec![SentinelError::OverlayCreationFailed {
                index: 1,
                reason: "CreateWindowExW failed".to_string(),
            }]
        );
        assert_eq!(manager.covered_monitors().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_input_during_grace_is_ignored() {
        let backend = FakeSurfaces::default();
        let mut manager = OverlayManager::new(backend.clone(), GRACE);
        let t0 = Instant::now();
        manager.show(&descriptors(&[true]), t0);
        let handle = backend.0.borrow().live[0];

        assert_eq!(
            manager.input_event(handle, t0 + Duration::from_millis(100)),
            InputVerdict::Ignored
        );
        assert_eq!(
            manager.input_event(handle, t0 + Duration::from_millis(500)),
            InputVerdict::Deactivate
        );
        // Unknown surfaces never deactivate.
        assert_eq!(
            manager.input_event(999, t0 + Duration::from_secs(5)),
            InputVerdict::Ignored
        );
    }
}
