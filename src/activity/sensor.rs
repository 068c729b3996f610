use std::time::Duration;

use anyhow::Result;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::SentinelError;

/// Time since the last keyboard/mouse input.
pub trait IdleClock {
    fn idle_duration(&self) -> Result<Duration>;
}

/// Something that can tell whether media playback is keeping the display on.
pub trait PlaybackProbe {
    /// Short identifier for logs and diagnostics.
    fn name(&self) -> &'static str;

    fn is_playing(&self) -> Result<bool>;

    /// Pick up tunables from a newly applied configuration.
    fn apply_config(&mut self, _config: &Config) {}
}

/// One reading of the sensor, taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySample {
    pub idle: Duration,
    pub playback_active: bool,
}

/// Idle/activity sensor.
pub struct ActivitySensor {
    clock: Box<dyn IdleClock>,
    probes: Vec<Box<dyn PlaybackProbe>>,
    /// When false, playback never suppresses blanking.
    suppress_during_playback: bool,
    /// Sensors currently failing, so each outage is reported once.
    failing: Vec<&'static str>,
    /// Outages not yet handed to the notification sink.
    faults: Vec<SentinelError>,
}

const IDLE_SENSOR: &str = "idle";

impl ActivitySensor {
    pub fn new(clock: Box<dyn IdleClock>, suppress_during_playback: bool) -> Self {
        Self {
            clock,
            probes: Vec::new(),
            suppress_during_playback,
            failing: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Add a playback probe. Playback is active when any probe reports it.
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn PlaybackProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn set_suppress_during_playback(&mut self, enabled: bool) {
        self.suppress_during_playback = enabled;
    }

    pub fn apply_config(&mut self, config: &Config) {
        self.suppress_during_playback = config.suppress_during_playback;
        for probe in &mut self.probes {
            probe.apply_config(config);
        }
    }

    /// Time since the last user input. Zero if the clock is unavailable.
    pub fn idle_duration(&mut self) -> Duration {
        let result = self.clock.idle_duration();
        match result {
            Ok(idle) => {
                self.recovered(IDLE_SENSOR);
                idle
            }
            Err(e) => {
                self.failed(IDLE_SENSOR, &e);
                Duration::ZERO
            }
        }
    }

    /// Whether playback currently suppresses blanking.
    ///
    /// Always false when suppression is disabled; a failing probe counts as
    /// not playing.
    pub fn is_playback_active(&mut self) -> bool {
        if !self.suppress_during_playback {
            return false;
        }

        let mut playing = false;
        for i in 0..self.probes.len() {
            let name = self.probes[i].name();
            let result = self.probes[i].is_playing();
            match result {
                Ok(p) => {
                    self.recovered(name);
                    if p {
                        trace!("Playback reported by {}", name);
                        playing = true;
                    }
                }
                Err(e) => self.failed(name, &e),
            }
        }
        playing
    }

    /// Take one reading for the current tick.
    pub fn sample(&mut self) -> ActivitySample {
        let sample = ActivitySample {
            idle: self.idle_duration(),
            playback_active: self.is_playback_active(),
        };
        trace!(
            "Sample: idle={:?} playback={}",
            sample.idle, sample.playback_active
        );
        sample
    }

    /// Drain outages detected since the last call.
    pub fn take_faults(&mut self) -> Vec<SentinelError> {
        std::mem::take(&mut self.faults)
    }

    fn failed(&mut self, sensor: &'static str, error: &anyhow::Error) {
        if self.failing.contains(&sensor) {
            trace!("{} sensor still unavailable: {:#}", sensor, error);
            return;
        }
        warn!("{} sensor unavailable: {:#}", sensor, error);
        self.failing.push(sensor);
        self.faults.push(SentinelError::SensorUnavailable {
            sensor,
            reason: format!("{error:#}"),
        });
    }

    fn recovered(&mut self, sensor: &'static str) {
        if let Some(pos) = self.failing.iter().position(|s| *s == sensor) {
            debug!("{} sensor recovered", sensor);
            self.failing.swap_remove(pos);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Idle clock the test can move; `None` simulates a failing query.
    #[derive(Clone, Default)]
    pub(crate) struct FakeClock(pub Rc<Cell<Option<Duration>>>);

    impl FakeClock {
        pub(crate) fn set(&self, idle: Duration) {
            self.0.set(Some(idle));
        }

        pub(crate) fn fail(&self) {
            self.0.set(None);
        }
    }

    impl IdleClock for FakeClock {
        fn idle_duration(&self) -> Result<Duration> {
            self.0
                .get()
                .ok_or_else(|| anyhow::anyhow!("GetLastInputInfo failed"))
        }
    }

    /// Playback probe the test can toggle; `None` simulates a failing query.
    #[derive(Clone)]
    pub(crate) struct FakeProbe(pub Rc<Cell<Option<bool>>>);

    impl Default for FakeProbe {
        fn default() -> Self {
            Self(Rc::new(Cell::new(Some(false))))
        }
    }

    impl FakeProbe {
        pub(crate) fn set(&self, playing: bool) {
            self.0.set(Some(playing));
        }

        pub(crate) fn fail(&self) {
            self.0.set(None);
        }
    }

    impl PlaybackProbe for FakeProbe {
        fn name(&self) -> &'static str {
            "fake-playback"
        }

        fn is_playing(&self) -> Result<bool> {
            self.0
                .get()
                .ok_or_else(|| anyhow::anyhow!("probe offline"))
        }
    }

    #[test]
    fn test_sample_reads_clock_and_probe() {
        let clock = FakeClock::default();
        let probe = FakeProbe::default();
        let mut sensor = ActivitySensor::new(Box::new(clock.clone()), true)
            .with_probe(Box::new(probe.clone()));

        clock.set(Duration::from_secs(12));
        probe.set(true);
        assert_eq!(
            sensor.sample(),
            ActivitySample {
                idle: Duration::from_secs(12),
                playback_active: true,
            }
        );
    }

    #[test]
    fn test_suppression_disabled_ignores_playback() {
        let probe = FakeProbe::default();
        probe.set(true);
        let mut sensor = ActivitySensor::new(Box::new(FakeClock::default()), false)
            .with_probe(Box::new(probe.clone()));
        assert!(!sensor.is_playback_active());

        sensor.set_suppress_during_playback(true);
        assert!(sensor.is_playback_active());
    }

    #[test]
    fn test_any_probe_reports_playback() {
        let quiet = FakeProbe::default();
        let loud = FakeProbe::default();
        let mut sensor = ActivitySensor::new(Box::new(FakeClock::default()), true)
            .with_probe(Box::new(quiet.clone()))
            .with_probe(Box::new(loud.clone()));

        assert!(!sensor.is_playback_active());
        loud.set(true);
        assert!(sensor.is_playback_active());
    }

    #[test]
    fn test_failing_clock_degrades_to_zero_idle() {
        let clock = FakeClock::default();
        clock.fail();
        let mut sensor = ActivitySensor::new(Box::new(clock), true);

        assert_eq!(sensor.idle_duration(), Duration::ZERO);
    }

    #[test]
    fn test_failing_probe_degrades_to_not_playing() {
        let probe = FakeProbe::default();
        probe.fail();
        let mut sensor = ActivitySensor::new(Box::new(FakeClock::default()), true)
            .with_probe(Box::new(probe));

        assert!(!sensor.is_playback_active());
    }

    #[test]
    fn test_outage_reported_once_until_recovery() {
        let clock = FakeClock::default();
        clock.fail();
        let mut sensor = ActivitySensor::new(Box::new(clock.clone()), true);

        sensor.sample();
        sensor.sample();
        let faults = sensor.take_faults();
        assert_eq!(faults.len(), 1);
        assert!(matches!(
            faults[0],
            SentinelError::SensorUnavailable { sensor: "idle", .. }
        ));

        clock.set(Duration::from_secs(1));
        sensor.sample();
        clock.fail();
        sensor.sample();
        assert_eq!(sensor.take_faults().len(), 1);
    }
}
