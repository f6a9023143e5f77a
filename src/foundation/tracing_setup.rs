//! Global tracing subscriber setup for the `cirrus` binary.
//!
//! The library only emits events; installing a subscriber is the binary's job.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::foundation::error::CirrusResult;

/// Where log lines go.
#[derive(Clone, Debug)]
pub enum LogTarget {
    /// Human-readable lines on stderr.
    Stderr,
    /// Plain (no ANSI) lines appended to a file.
    File(PathBuf),
    /// Install nothing; events are dropped.
    Off,
}

/// Install the global subscriber. `RUST_LOG` overrides `default_level`.
pub fn init(target: LogTarget, default_level: tracing::Level) -> CirrusResult<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(env_filter)
                .try_init()
                .context("install stderr tracing subscriber")?;
        }
        LogTarget::File(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file '{}'", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .with(env_filter)
                .try_init()
                .context("install file tracing subscriber")?;
        }
        LogTarget::Off => {}
    }
    Ok(())
}
