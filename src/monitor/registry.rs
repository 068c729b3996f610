use tracing::{debug, info};

use crate::config::Config;

use super::types::{MonitorDescriptor, MonitorInfo};

/// Source of the current display topology.
pub trait DisplayEnumerator {
    /// Every connected monitor in a stable order. Empty on failure.
    fn enumerate(&self) -> Vec<MonitorInfo>;
}

/// The ordered list of known monitors, joined with their enable flags.
pub struct MonitorRegistry<E> {
    enumerator: E,
    monitors: Vec<MonitorDescriptor>,
}

impl<E: DisplayEnumerator> MonitorRegistry<E> {
    /// Create an empty registry; call [`refresh`](Self::refresh) to populate it.
    pub fn new(enumerator: E) -> Self {
        Self {
            enumerator,
            monitors: Vec::new(),
        }
    }

    /// Re-enumerate displays and rebuild the descriptor list.
    ///
    /// The configured flag list is resized to the new monitor count so that
    /// newly discovered monitors start enabled. Returns the monitor count.
    pub fn refresh(&mut self, config: &mut Config) -> usize {
        let found = self.enumerator.enumerate();
        config.sync_monitor_count(found.len());

        self.monitors = found
            .into_iter()
            .enumerate()
            .map(|(index, info)| MonitorDescriptor {
                index,
                enabled: config.is_monitor_enabled(index),
                info,
            })
            .collect();

        info!("Found {} monitor(s)", self.monitors.len());
        for mon in &self.monitors {
            debug!(
                "  [{}] {}x{} at ({}, {}){}{}",
                mon.label(),
                mon.info.width,
                mon.info.height,
                mon.info.x,
                mon.info.y,
                if mon.info.primary { " primary" } else { "" },
                if mon.enabled { "" } else { " (disabled)" },
            );
        }
        self.monitors.len()
    }

    /// Re-read enable flags from `config` without re-enumerating.
    pub fn apply_config(&mut self, config: &Config) {
        for mon in &mut self.monitors {
            mon.enabled = config.is_monitor_enabled(mon.index);
        }
    }

    pub fn monitors(&self) -> &[MonitorDescriptor] {
        &self.monitors
    }

    pub fn enabled_count(&self) -> usize {
        self.monitors.iter().filter(|m| m.enabled).count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Enumerator returning whatever list the test last set.
    #[derive(Clone, Default)]
    pub(crate) struct FakeDisplays(pub Rc<RefCell<Vec<MonitorInfo>>>);

    impl FakeDisplays {
        pub(crate) fn with(count: usize) -> Self {
            let fake = Self::default();
            fake.set(count);
            fake
        }

        pub(crate) fn set(&self, count: usize) {
            *self.0.borrow_mut() = (0..count).map(fake_monitor).collect();
        }
    }

    impl DisplayEnumerator for FakeDisplays {
        fn enumerate(&self) -> Vec<MonitorInfo> {
            self.0.borrow().clone()
        }
    }

    pub(crate) fn fake_monitor(i: usize) -> MonitorInfo {
        MonitorInfo {
            name: format!("\\\\.\\DISPLAY{}", i + 1),
            x: 1920 * i as i32,
            y: 0,
            width: 1920,
            height: 1080,
            primary: i == 0,
            hmonitor: 0x1000 + i as isize,
        }
    }

    #[test]
    fn test_refresh_enables_new_monitors() {
        let mut config = Config::default();
        let mut registry = MonitorRegistry::new(FakeDisplays::with(3));

        assert_eq!(registry.refresh(&mut config), 3);
        assert_eq!(config.monitor_enabled, vec![true, true, true]);
        assert_eq!(registry.enabled_count(), 3);
        assert!(registry.monitors()[0].info.primary);
        assert_eq!(registry.monitors()[2].index, 2);
    }

    #[test]
    fn test_refresh_keeps_configured_flags() {
        let mut config = Config {
            monitor_enabled: vec![true, false],
            ..Config::default()
        };
        let displays = FakeDisplays::with(2);
        let mut registry = MonitorRegistry::new(displays.clone());
        registry.refresh(&mut config);
        assert_eq!(registry.enabled_count(), 1);

        // A third monitor is plugged in.
        displays.set(3);
        registry.refresh(&mut config);
        assert_eq!(config.monitor_enabled, vec![true, false, true]);
        assert_eq!(registry.enabled_count(), 2);
        assert!(!registry.monitors()[1].enabled);
    }

    #[test]
    fn test_empty_enumeration_keeps_flags() {
        let mut config = Config {
            monitor_enabled: vec![false, true],
            ..Config::default()
        };
        let mut registry = MonitorRegistry::new(FakeDisplays::with(0));

        assert_eq!(registry.refresh(&mut config), 0);
        assert!(registry.monitors().is_empty());
        assert_eq!(config.monitor_enabled, vec![false, true]);
    }

    #[test]
    fn test_apply_config() {
        let mut config = Config::default();
        let mut registry = MonitorRegistry::new(FakeDisplays::with(2));
        registry.refresh(&mut config);

        config.monitor_enabled = vec![false, false];
        registry.apply_config(&config);
        assert_eq!(registry.enabled_count(), 0);
    }

    #[test]
    fn test_label() {
        let mut config = Config::default();
        let mut registry = MonitorRegistry::new(FakeDisplays::with(1));
        registry.refresh(&mut config);
        assert_eq!(registry.monitors()[0].label(), "DISPLAY1 (1)");
    }
}
