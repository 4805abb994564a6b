//! Helpers for exercising the core in tests and benchmarks.

/// A render batch that records what it is given.
pub mod batch;
/// Small widgets with observable behavior.
pub mod widgets;

use tracing::Level;
use tracing_subscriber::fmt;

pub use batch::{DrawCall, RecordingBatch};
pub use widgets::{Block, Probe, ProbeLog};

/// Route tracing output to the test harness. Safe to call more than once.
pub fn init_tracing() {
    fmt()
        .with_test_writer()
        .with_max_level(Level::TRACE)
        .without_time()
        .compact()
        .try_init()
        .ok();
}
