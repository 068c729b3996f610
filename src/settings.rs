//! The editable state behind the settings window: a draft config, what is
//! on disk, and the monitor list the per-monitor flags refer to.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::monitor::{DisplayEnumerator, MonitorDescriptor, MonitorRegistry};

pub struct SettingsDraft<E> {
    path: PathBuf,
    config: Config,
    saved: Config,
    registry: MonitorRegistry<E>,
}

impl<E: DisplayEnumerator> SettingsDraft<E> {
    /// Read `path` (or defaults) and enumerate monitors.
    pub fn load(path: PathBuf, enumerator: E) -> Result<Self> {
        let mut config =
            Config::load_or_default(&path).context("Failed to load configuration")?;
        let mut registry = MonitorRegistry::new(enumerator);
        registry.refresh(&mut config);
        // Flags filled in for newly seen monitors are not an edit.
        let saved = config.clone();

        Ok(Self {
            path,
            config,
            saved,
            registry,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn monitors(&self) -> &[MonitorDescriptor] {
        self.registry.monitors()
    }

    pub fn is_dirty(&self) -> bool {
        self.config != self.saved
    }

    pub fn set_timeout(&mut self, seconds: u64) {
        self.config.idle_timeout_seconds = seconds;
        self.config = self.config.clone().normalized();
    }

    pub fn toggle_suppression(&mut self) {
        self.config.suppress_during_playback = !self.config.suppress_during_playback;
    }

    pub fn toggle_startup(&mut self) {
        self.config.start_with_windows = !self.config.start_with_windows;
    }

    pub fn toggle_debug(&mut self) {
        self.config.debug = !self.config.debug;
    }

    /// Flip monitor `index`. Unknown indices are ignored.
    pub fn toggle_monitor(&mut self, index: usize) {
        let Some(flag) = self.config.monitor_enabled.get_mut(index) else {
            return;
        };
        *flag = !*flag;
        self.registry.apply_config(&self.config);
    }

    /// Write the draft to disk; it becomes the new baseline.
    pub fn save(&mut self) -> Result<()> {
        self.config.save(&self.path)?;
        self.saved = self.config.clone();
        Ok(())
    }

    /// Drop every edit since the last load or save.
    pub fn revert(&mut self) {
        self.config = self.saved.clone();
        self.registry.apply_config(&self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::registry::tests::FakeDisplays;

    fn draft_with(
        contents: &str,
        monitors: usize,
    ) -> (tempfile::TempDir, SettingsDraft<FakeDisplays>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        let draft = SettingsDraft::load(path, FakeDisplays::with(monitors)).unwrap();
        (dir, draft)
    }

    #[test]
    fn test_new_monitors_do_not_mark_draft_dirty() {
        let (_dir, draft) = draft_with("monitor_enabled = [false]\n", 3);

        assert_eq!(draft.config().monitor_enabled, vec![false, true, true]);
        assert_eq!(draft.monitors().len(), 3);
        assert!(!draft.is_dirty());
    }

    #[test]
    fn test_edit_then_revert() {
        let (_dir, mut draft) = draft_with("idle_timeout_seconds = 120\n", 2);

        draft.toggle_monitor(1);
        draft.set_timeout(1);
        assert!(draft.is_dirty());
        assert!(!draft.monitors()[1].enabled);
        assert_eq!(draft.config().idle_timeout_seconds, 5);

        draft.revert();
        assert!(!draft.is_dirty());
        assert!(draft.monitors()[1].enabled);
        assert_eq!(draft.config().idle_timeout_seconds, 120);
    }

    #[test]
    fn test_toggle_unknown_monitor_is_ignored() {
        let (_dir, mut draft) = draft_with("", 1);
        draft.toggle_monitor(7);
        assert!(!draft.is_dirty());
    }

    #[test]
    fn test_save_becomes_baseline() {
        let (_dir, mut draft) = draft_with("", 2);
        draft.toggle_suppression();
        draft.toggle_monitor(0);
        draft.save().unwrap();
        assert!(!draft.is_dirty());

        let reloaded = Config::load(draft.path()).unwrap();
        assert!(!reloaded.suppress_during_playback);
        assert_eq!(reloaded.monitor_enabled, vec![false, true]);
    }
}
