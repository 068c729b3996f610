//! Central application controller.
//!
//! Owns the live configuration, the monitor registry, the activity sensor,
//! the blanking machine and the notification sink, and exposes one entry
//! point per event the platform loop delivers.

use std::time::Instant;

use tracing::{debug, info};

use crate::activity::ActivitySensor;
use crate::blanking::{BlankingMachine, DeactivationReason, Verdict};
use crate::config::Config;
use crate::error::SentinelError;
use crate::monitor::{DisplayEnumerator, MonitorDescriptor, MonitorRegistry};
use crate::notify::NotificationSink;
use crate::overlay::SurfaceBackend;

pub struct App<E: DisplayEnumerator, B: SurfaceBackend> {
    config: Config,
    registry: MonitorRegistry<E>,
    sensor: ActivitySensor,
    machine: BlankingMachine<B>,
    sink: Box<dyn NotificationSink>,
}

impl<E: DisplayEnumerator, B: SurfaceBackend> App<E, B> {
    /// Build the controller and run the initial monitor enumeration.
    pub fn new(
        config: Config,
        enumerator: E,
        mut sensor: ActivitySensor,
        backend: B,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        let mut config = config.normalized();
        sensor.apply_config(&config);

        let mut registry = MonitorRegistry::new(enumerator);
        let count = registry.refresh(&mut config);
        let machine = BlankingMachine::new(backend, config.timing(), config.input_grace());

        let mut app = Self {
            config,
            registry,
            sensor,
            machine,
            sink,
        };
        if count == 0 {
            app.sink.diagnostic(&SentinelError::EnumerationEmpty);
        }
        app
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn monitors(&self) -> &[MonitorDescriptor] {
        self.registry.monitors()
    }

    pub fn machine(&self) -> &BlankingMachine<B> {
        &self.machine
    }

    pub fn is_active(&self) -> bool {
        self.machine.is_active()
    }

    /// Periodic evaluation: sample the sensor and run the state machine.
    pub fn tick(&mut self, now: Instant) -> Verdict {
        let sample = self.sensor.sample();
        for fault in self.sensor.take_faults() {
            self.sink.diagnostic(&fault);
        }
        self.machine
            .tick(&sample, now, self.registry.monitors(), self.sink.as_mut())
    }

    /// Blank now, on user request.
    pub fn manual_activate(&mut self, now: Instant) -> bool {
        self.machine
            .request_activation(now, self.registry.monitors(), self.sink.as_mut())
    }

    /// Wake the displays, on user request.
    pub fn manual_deactivate(&mut self) -> bool {
        self.machine.request_deactivation(self.sink.as_mut())
    }

    /// Blank if idle, wake if blanking. Returns whether blanking is now active.
    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.machine.is_active() {
            self.manual_deactivate();
        } else {
            self.manual_activate(now);
        }
        self.machine.is_active()
    }

    /// Input arrived on an overlay surface.
    pub fn overlay_input(&mut self, handle: B::Handle, now: Instant) -> bool {
        self.machine.overlay_input(handle, now, self.sink.as_mut())
    }

    /// Monitor topology changed: drop the overlays, then re-enumerate.
    /// Returns the new monitor count.
    pub fn display_changed(&mut self) -> usize {
        info!("Display configuration changed");
        self.machine
            .force_idle(DeactivationReason::DisplayChange, self.sink.as_mut());

        let count = self.registry.refresh(&mut self.config);
        if count == 0 {
            self.sink.diagnostic(&SentinelError::EnumerationEmpty);
        }
        count
    }

    /// Replace the live configuration.
    ///
    /// The monitor flags are re-synced to the known monitor count, and if
    /// blanking is active the surfaces are rebuilt for the new enabled set.
    pub fn apply_config(&mut self, config: Config, now: Instant) {
        let mut config = config.normalized();
        config.sync_monitor_count(self.registry.monitors().len());

        self.sensor.apply_config(&config);
        self.registry.apply_config(&config);
        self.machine
            .set_timing(config.timing(), config.input_grace());
        self.machine
            .refresh_surfaces(self.registry.monitors(), now, self.sink.as_mut());

        debug!("Configuration applied: {:?}", config);
        self.config = config;
    }

    /// Tear down every overlay before the process exits.
    pub fn shutdown(&mut self) {
        info!("Shutting down");
        self.machine
            .force_idle(DeactivationReason::Shutdown, self.sink.as_mut());
    }
}

impl<E: DisplayEnumerator, B: SurfaceBackend> Drop for App<E, B> {
    /// Overlays and the hidden cursor never outlive the controller, even
    /// when it is dropped on an error path without [`App::shutdown`].
    fn drop(&mut self) {
        if self.machine.is_active() {
            self.shutdown();
        }
    }
}
