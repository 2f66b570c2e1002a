//! Optional subscriber installation, behind the `logging` feature.
//!
//! The harness itself only emits `tracing` events; hosts that embed it
//! normally install their own subscriber and this module stays out of the
//! build. For standalone use (demos, debugging a host integration) it
//! installs one process-wide compact subscriber, filtered to the events the
//! postprocessor emits.

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static INSTALL: Once = Once::new();

/// How much of the postprocessor's output to show.
///
/// The levels fold onto what the harness emits: rejected cycles and engine
/// loss at warn/error, per-cycle summaries and invalidations at debug, and
/// per-file provider reads at trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Failures only.
    Errors,
    /// Failures plus per-cycle summaries (the default).
    #[default]
    Cycles,
    /// Everything, down to individual provider reads.
    Reads,
}

impl Verbosity {
    /// Filter directive scoped to this crate, leaving the host's own
    /// targets untouched.
    fn directive(self) -> &'static str {
        match self {
            Verbosity::Errors => "regraft_harness=warn",
            Verbosity::Cycles => "regraft_harness=debug",
            Verbosity::Reads => "regraft_harness=trace",
        }
    }
}

fn install(filter: EnvFilter) {
    INSTALL.call_once(|| {
        let _ = fmt()
            .compact()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

/// Install the process-wide subscriber at the given verbosity.
///
/// Only the first call per process takes effect; later calls from any
/// thread are no-ops.
pub fn init_logging(verbosity: Verbosity) {
    install(EnvFilter::new(verbosity.directive()));
}

/// Install the subscriber from `RUST_LOG`, falling back to
/// [`Verbosity::Cycles`] when the variable is unset or invalid.
pub fn init_logging_from_env() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Verbosity::default().directive()));
    install(filter);
}
