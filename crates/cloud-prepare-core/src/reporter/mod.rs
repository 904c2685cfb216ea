// # Reporter Implementations
//
// Stock implementations of the Reporter trait.

pub mod logging;
pub mod recording;

pub use self::recording::{RecordingReporter, ReportEvent};
pub use self::logging::TracingReporter;
