//! Startup configuration for the service and CLI.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::foundation::error::SlidecastResult;

/// Upper bound applied to each remote fetch when none is configured.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Service-wide settings, built once at startup and passed down explicitly.
///
/// Nothing in the pipeline reads ambient global state; handlers and the CLI
/// both thread a `ServiceConfig` through [`crate::server::RenderService`] and
/// the render entry points.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Flat directory where finished artifacts are written. The static file
    /// route serves straight out of this directory.
    pub output_dir: PathBuf,
    /// Per-request timeout for fetching remote image and audio references.
    pub fetch_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    /// Create the output directory if it does not exist yet.
    pub fn ensure_output_dir(&self) -> SlidecastResult<()> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("create output directory '{}'", self.output_dir.display())
        })?;
        Ok(())
    }
}
