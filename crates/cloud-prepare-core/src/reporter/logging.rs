// # Tracing Reporter
//
// Sends progress to the `tracing` subscriber. This is what the
// `cloud-prepare` binary uses.

use crate::error::Error;
use crate::traits::Reporter;

/// Reporter that logs progress through `tracing`
///
/// Every event carries a `cloud` field so that output from several clouds
/// stays distinguishable.
#[derive(Debug, Clone)]
pub struct TracingReporter {
    cloud: &'static str,
}

impl TracingReporter {
    /// Create a reporter tagging events with the given cloud name
    pub fn new(cloud: &'static str) -> Self {
        Self { cloud }
    }
}

impl Reporter for TracingReporter {
    fn started(&self, message: &str) {
        tracing::info!(target: "cloud_prepare", cloud = self.cloud, "▶ {}", message);
    }

    fn succeeded(&self, message: &str) {
        tracing::info!(target: "cloud_prepare", cloud = self.cloud, "✔ {}", message);
    }

    fn failed(&self, error: &Error) {
        tracing::error!(target: "cloud_prepare", cloud = self.cloud, "✘ {}", error);
    }
}
