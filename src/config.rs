//! Configuration loading, defaults and normalization for oled-sentinel.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::blanking::BlankingTiming;

/// Supported idle timeout range, in seconds.
pub const IDLE_TIMEOUT_RANGE: (u64, u64) = (5, 3600);

/// Main configuration for oled-sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds of inactivity before the displays are blanked (default: 300).
    pub idle_timeout_seconds: u64,

    /// Skip automatic blanking while media playback keeps the display on.
    pub suppress_during_playback: bool,

    /// Audio peak level (0.0-1.0) above which the default output device
    /// counts as playing.
    pub audio_peak_threshold: f32,

    /// Per-monitor enable flags, indexed in enumeration order.
    /// Monitors beyond the end of the list are enabled.
    pub monitor_enabled: Vec<bool>,

    /// Verbose logging.
    pub debug: bool,

    /// Register the executable to run at logon.
    pub start_with_windows: bool,

    /// Period of the idle evaluation tick, in milliseconds (default: 500).
    pub tick_interval_ms: u64,

    /// Time after a manual activation during which input cannot cancel it.
    pub manual_cooldown_ms: u64,

    /// Time after an overlay appears during which its own input is ignored.
    pub input_grace_ms: u64,

    /// Idle duration below which input counts as fresh when clearing a
    /// manual activation.
    pub fresh_input_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: 300,
            suppress_during_playback: true,
            audio_peak_threshold: 0.001,
            monitor_enabled: Vec::new(),
            debug: false,
            start_with_windows: false,
            tick_interval_ms: 500,
            manual_cooldown_ms: 2500,
            input_grace_ms: 500,
            fresh_input_ms: 2000,
        }
    }
}

impl Config {
    /// Default config file location: `<config dir>/oled-sentinel/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("oled-sentinel").join("config.toml"))
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Load configuration from `path`, or return defaults if the file does
    /// not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the configuration back to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Clamp every tunable into its supported range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let (min, max) = IDLE_TIMEOUT_RANGE;
        self.idle_timeout_seconds = self.idle_timeout_seconds.clamp(min, max);
        self.tick_interval_ms = self.tick_interval_ms.clamp(100, 1000);
        self.manual_cooldown_ms = self.manual_cooldown_ms.min(30_000);
        self.input_grace_ms = self.input_grace_ms.min(5_000);
        self.fresh_input_ms = self.fresh_input_ms.clamp(100, 30_000);
        self.audio_peak_threshold = if self.audio_peak_threshold.is_finite() {
            self.audio_peak_threshold.clamp(0.0, 1.0)
        } else {
            Self::default().audio_peak_threshold
        };
        self
    }

    /// Whether monitor `index` should be blanked.
    pub fn is_monitor_enabled(&self, index: usize) -> bool {
        self.monitor_enabled.get(index).copied().unwrap_or(true)
    }

    /// Resize the per-monitor flags to the last known monitor count.
    ///
    /// Newly discovered monitors start enabled. A count of zero is treated
    /// as a failed enumeration and leaves the flags untouched.
    pub fn sync_monitor_count(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.monitor_enabled.resize(count, true);
    }

    /// Timing parameters for the blanking state machine.
    pub fn timing(&self) -> BlankingTiming {
        BlankingTiming {
            idle_timeout: Duration::from_secs(self.idle_timeout_seconds),
            manual_cooldown: Duration::from_millis(self.manual_cooldown_ms),
            fresh_input: Duration::from_millis(self.fresh_input_ms),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn input_grace(&self) -> Duration {
        Duration::from_millis(self.input_grace_ms)
    }
}

/// Detects edits to the config file by polling its modification time.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    /// Start watching `path`, treating its current state as already seen.
    pub fn new(path: PathBuf) -> Self {
        let last_modified = modified_time(&path);
        Self {
            path,
            last_modified,
        }
    }

    /// Returns a freshly loaded config if the file changed since the last
    /// call. A file that disappeared is not reported.
    pub fn poll(&mut self) -> Option<Result<Config>> {
        let modified = modified_time(&self.path);
        if modified.is_none() || modified == self.last_modified {
            return None;
        }
        self.last_modified = modified;
        Some(Config::load(&self.path))
    }

    /// Record the file's current state as seen, e.g. after saving it ourselves.
    pub fn mark_seen(&mut self) {
        self.last_modified = modified_time(&self.path);
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.idle_timeout_seconds, 300);
        assert!(config.suppress_during_playback);
        assert!(!config.debug);
        assert!(!config.start_with_windows);
        assert!(config.monitor_enabled.is_empty());
        assert_eq!(config.timing().manual_cooldown, Duration::from_millis(2500));
        assert_eq!(config.timing().fresh_input, Duration::from_secs(2));
        assert_eq!(config.input_grace(), Duration::from_millis(500));
    }

    #[test]
    fn test_timeout_is_clamped() {
        let low = Config {
            idle_timeout_seconds: 1,
            ..Config::default()
        }
        .normalized();
        assert_eq!(low.idle_timeout_seconds, 5);

        let high = Config {
            idle_timeout_seconds: 86_400,
            ..Config::default()
        }
        .normalized();
        assert_eq!(high.idle_timeout_seconds, 3600);

        let nan = Config {
            audio_peak_threshold: f32::NAN,
            tick_interval_ms: 10,
            ..Config::default()
        }
        .normalized();
        assert!((nan.audio_peak_threshold - 0.001).abs() < f32::EPSILON);
        assert_eq!(nan.tick_interval_ms, 100);
    }

    #[test]
    fn test_parse_toml_with_unknown_and_missing_keys() {
        let toml_str = r#"
            idle_timeout_seconds = 60
            suppress_during_playback = false
            monitor_enabled = [true, false, true]
            some_future_option = "ignored"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.idle_timeout_seconds, 60);
        assert!(!config.suppress_during_playback);
        assert_eq!(config.monitor_enabled, vec![true, false, true]);
        // Missing keys fall back to defaults.
        assert_eq!(config.tick_interval_ms, 500);
        assert!(!config.debug);
    }

    #[test]
    fn test_monitor_flags() {
        let mut config = Config {
            monitor_enabled: vec![false, true],
            ..Config::default()
        };
        assert!(!config.is_monitor_enabled(0));
        assert!(config.is_monitor_enabled(1));
        // Unknown monitors default to enabled.
        assert!(config.is_monitor_enabled(7));

        config.sync_monitor_count(4);
        assert_eq!(config.monitor_enabled, vec![false, true, true, true]);

        config.sync_monitor_count(0);
        assert_eq!(config.monitor_enabled.len(), 4);

        config.sync_monitor_count(1);
        assert_eq!(config.monitor_enabled, vec![false]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            idle_timeout_seconds: 120,
            monitor_enabled: vec![true, false],
            start_with_windows: true,
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_clamps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "idle_timeout_seconds = 2\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.idle_timeout_seconds, 5);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "idle_timeout_seconds = \"soon\"\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_watcher_reports_new_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut watcher = ConfigWatcher::new(path.clone());
        assert!(watcher.poll().is_none());

        Config {
            idle_timeout_seconds: 42,
            ..Config::default()
        }
        .save(&path)
        .unwrap();

        let reloaded = watcher.poll().unwrap().unwrap();
        assert_eq!(reloaded.idle_timeout_seconds, 42);
        assert!(watcher.poll().is_none());
    }

    #[test]
    fn test_watcher_mark_seen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut watcher = ConfigWatcher::new(path.clone());
        Config::default().save(&path).unwrap();
        watcher.mark_seen();
        assert!(watcher.poll().is_none());
    }
}
