// # Reporter Trait
//
// Progress sink for cloud operations.
//
// A `Cloud` operation reports `started` once when it begins, then exactly one
// of `succeeded` or `failed`. Implementations decide where the messages go
// (logs, a terminal spinner, a status API).

use crate::error::Error;

/// Receives progress from a running [`Cloud`](crate::Cloud) operation
///
/// Implementations must be thread-safe: operations are async and may be
/// driven from any runtime worker.
pub trait Reporter: Send + Sync {
    /// An operation (or a notable step of it) has started
    fn started(&self, message: &str);

    /// The operation finished successfully
    fn succeeded(&self, message: &str);

    /// The operation failed with the given error
    fn failed(&self, error: &Error);
}

/// Report a failed step before propagating it
///
/// ```rust
/// use cloud_prepare_core::{Error, RecordingReporter, ReportResult};
///
/// let reporter = RecordingReporter::new();
/// let step: Result<(), Error> = Err(Error::not_found("infra-vnet"));
///
/// assert!(step.or_report(&reporter).is_err());
/// assert_eq!(reporter.failure_count(), 1);
/// ```
pub trait ReportResult<T> {
    /// Call `reporter.failed(..)` if this is an error, then return it unchanged
    fn or_report(self, reporter: &dyn Reporter) -> Result<T, Error>;
}

impl<T> ReportResult<T> for Result<T, Error> {
    fn or_report(self, reporter: &dyn Reporter) -> Result<T, Error> {
        if let Err(ref err) = self {
            reporter.failed(err);
        }
        self
    }
}
