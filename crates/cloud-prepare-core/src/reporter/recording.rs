// # Recording Reporter
//
// Keeps every progress event in memory, in order.
//
// ## When to Use
//
// - Embedding applications that render progress themselves
// - Tests asserting the started → succeeded/failed contract

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Error;
use crate::traits::Reporter;

/// A single progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// `Reporter::started` was called
    Started(String),
    /// `Reporter::succeeded` was called
    Succeeded(String),
    /// `Reporter::failed` was called (error rendered with `Display`)
    Failed(String),
}

/// Reporter that records events
///
/// Clones share the same event list.
///
/// # Example
///
/// ```rust
/// use cloud_prepare_core::{RecordingReporter, ReportEvent, Reporter};
///
/// let reporter = RecordingReporter::new();
/// reporter.started("Opening ports");
/// reporter.succeeded("Opened ports");
///
/// assert_eq!(
///     reporter.events(),
///     vec![
///         ReportEvent::Started("Opening ports".to_string()),
///         ReportEvent::Succeeded("Opened ports".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl RecordingReporter {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<ReportEvent> {
        self.lock().clone()
    }

    /// Number of `failed` events so far
    pub fn failure_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, ReportEvent::Failed(_)))
            .count()
    }

    /// The last event, if any
    pub fn last(&self) -> Option<ReportEvent> {
        self.lock().last().cloned()
    }

    fn push(&self, event: ReportEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for RecordingReporter {
    fn started(&self, message: &str) {
        self.push(ReportEvent::Started(message.to_string()));
    }

    fn succeeded(&self, message: &str) {
        self.push(ReportEvent::Succeeded(message.to_string()));
    }

    fn failed(&self, error: &Error) {
        self.push(ReportEvent::Failed(error.to_string()));
    }
}
