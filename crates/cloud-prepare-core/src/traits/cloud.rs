// # Cloud Trait
//
// Defines the interface for preparing a cloud platform's networking so that
// Submariner can run on it, and for reverting those changes.
//
// ## Implementations
//
// - Azure: `cloud-prepare-azure` crate
//
// ## Usage
//
// ```rust,ignore
// use cloud_prepare_core::{Cloud, PortSpec, PrepareForSubmarinerInput, TracingReporter};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let cloud = /* Cloud implementation */;
//     let reporter = TracingReporter::new(cloud.cloud_name());
//
//     let input = PrepareForSubmarinerInput::new(vec![PortSpec::udp(4500), PortSpec::udp(4490)]);
//     cloud.prepare_for_submariner(&input, &reporter).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::ports::PrepareForSubmarinerInput;
use crate::traits::reporter::Reporter;

/// Trait for cloud implementations
///
/// Each operation is a fixed sequence of existence checks and
/// create/update/delete calls against the cloud's management API.
///
/// # Reporting Contract
///
/// - `reporter.started(..)` is called once when the operation begins
/// - On the first failing step, `reporter.failed(err)` is called and the same
///   error is returned; later steps do not run
/// - On success, `reporter.succeeded(..)` is called once
///
/// # Idempotency
///
/// Both operations must be idempotent: running them again after a successful
/// run performs no writes against the cloud.
#[async_trait]
pub trait Cloud: Send + Sync {
    /// Open the ports Submariner needs and wire up the required resources
    ///
    /// # Parameters
    ///
    /// - `input`: Ports to open for intra-cluster communications
    /// - `reporter`: Progress sink
    async fn prepare_for_submariner(
        &self,
        input: &PrepareForSubmarinerInput,
        reporter: &dyn Reporter,
    ) -> Result<(), crate::Error>;

    /// Remove everything [`prepare_for_submariner`](Cloud::prepare_for_submariner) set up
    ///
    /// Resources that are already gone are not an error.
    async fn cleanup_after_submariner(&self, reporter: &dyn Reporter) -> Result<(), crate::Error>;

    /// Get the cloud name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the cloud (e.g., "azure")
    fn cloud_name(&self) -> &'static str;
}

/// Helper trait for constructing clouds from configuration
pub trait CloudFactory: Send + Sync {
    /// Create a Cloud instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Full preparation configuration (cloud + operation settings)
    ///
    /// # Returns
    ///
    /// A boxed Cloud trait object
    fn create(
        &self,
        config: &crate::config::PrepareConfig,
    ) -> Result<Box<dyn Cloud>, crate::Error>;
}
