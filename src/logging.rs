//! Logging setup.

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Lets the running daemon switch verbosity when the `debug` setting changes.
pub struct LogHandle {
    base_level: String,
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Initialize logging with the specified level, or `debug` when the
/// configuration asks for it.
pub fn init_logging(level: &str, debug: bool) -> Result<LogHandle> {
    let filter = build_filter(level, debug)?;
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(LogHandle {
        base_level: level.to_string(),
        handle,
    })
}

impl LogHandle {
    pub fn set_debug(&self, debug: bool) -> Result<()> {
        let filter = build_filter(&self.base_level, debug)?;
        self.handle
            .reload(filter)
            .context("Failed to update log filter")
    }
}

fn build_filter(level: &str, debug: bool) -> Result<EnvFilter> {
    let level = if debug { "debug" } else { level };
    EnvFilter::try_new(format!("oled_sentinel={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        assert!(build_filter("trace", false).is_ok());
        assert!(build_filter("warn", true).is_ok());
        assert_eq!(
            build_filter("warn", true).unwrap().to_string(),
            "oled_sentinel=debug"
        );
    }
}
