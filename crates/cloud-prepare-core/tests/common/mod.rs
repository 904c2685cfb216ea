//! Test doubles and common utilities for contract tests

use cloud_prepare_core::config::{CloudConfig, PrepareConfig};
use cloud_prepare_core::error::{Error, Result};
use cloud_prepare_core::traits::{Cloud, CloudFactory, ReportResult, Reporter};
use cloud_prepare_core::{PrepareForSubmarinerInput, format_ports};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A cloud whose operations run a fixed number of steps, optionally failing one
pub struct StepCloud {
    /// Index of the step that fails (None = all succeed)
    failing_step: Option<usize>,
    /// Number of steps executed so far
    executed: Arc<AtomicUsize>,
}

impl StepCloud {
    pub const STEPS: usize = 3;

    pub fn new(failing_step: Option<usize>) -> Self {
        Self {
            failing_step,
            executed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of steps that ran
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    /// Create a new StepCloud that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            failing_step: other.failing_step,
            executed: Arc::clone(&other.executed),
        }
    }

    fn step(&self, index: usize) -> Result<()> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        if self.failing_step == Some(index) {
            return Err(Error::provider("steps", format!("step {} failed", index)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Cloud for StepCloud {
    async fn prepare_for_submariner(
        &self,
        input: &PrepareForSubmarinerInput,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        reporter.started("Opening ports");
        for index in 0..Self::STEPS {
            self.step(index).or_report(reporter)?;
        }
        reporter.succeeded(&format!("Opened ports {}", format_ports(&input.internal_ports)));
        Ok(())
    }

    async fn cleanup_after_submariner(&self, reporter: &dyn Reporter) -> Result<()> {
        reporter.started("Closing ports");
        for index in 0..Self::STEPS {
            self.step(index).or_report(reporter)?;
        }
        reporter.succeeded("Closed ports");
        Ok(())
    }

    fn cloud_name(&self) -> &'static str {
        "steps"
    }
}

/// Factory handing out StepClouds that never fail
pub struct StepCloudFactory;

impl CloudFactory for StepCloudFactory {
    fn create(&self, config: &PrepareConfig) -> Result<Box<dyn Cloud>> {
        match &config.cloud {
            CloudConfig::Custom { factory, .. } if factory == "steps" => {
                Ok(Box::new(StepCloud::new(None)))
            }
            _ => Err(Error::config("Invalid config for steps cloud")),
        }
    }
}
