//! Failure reporting interface
//!
//! Failures are diagnostics with no effect on control flow. The driver
//! hands each failure to a reporter exactly once and then drops the raw
//! payload; nothing is retained for replay.

use crate::app::models::{DecodeError, DecodeFailure};
use tracing::warn;

/// Receives one report per isolated decode failure
pub trait FailureReporter {
    fn report(&mut self, failure: &DecodeFailure);
}

/// Default reporter: logs reason and offset through `tracing`
#[derive(Debug, Default)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&mut self, failure: &DecodeFailure) {
        warn!(
            "record failed at offset {}: {} ({} raw byte(s))",
            failure.offset.index,
            failure.reason,
            failure.raw.len()
        );
    }
}

/// Test reporter collecting reasons and offsets
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub reports: Vec<(u64, DecodeError)>,
}

impl FailureReporter for CollectingReporter {
    fn report(&mut self, failure: &DecodeFailure) {
        self.reports
            .push((failure.offset.index, failure.reason.clone()));
    }
}
