//! Structured JSON logging to a file.
//!
//! The TUI owns stdout and stderr, so log lines go to a file instead.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, `default_directive` fills in the rest.
pub fn build_filter(default_directive: &str) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match default_directive.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber writing JSON lines to `path`.
pub fn init_logging(path: &Path, default_directive: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(Mutex::new(file)),
        )
        .with(build_filter(default_directive))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
