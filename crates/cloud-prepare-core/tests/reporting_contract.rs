//! Contract Test: Progress Reporting
//!
//! Constraints verified:
//! - `started` is reported once, first
//! - A failing step is reported once and stops the operation
//! - Success is reported once, last

mod common;

use cloud_prepare_core::{Cloud, PortSpec, PrepareForSubmarinerInput, RecordingReporter, ReportEvent};
use common::*;

#[tokio::test]
async fn successful_prepare_reports_started_then_succeeded() {
    let cloud = StepCloud::new(None);
    let reporter = RecordingReporter::new();
    let input = PrepareForSubmarinerInput::new(vec![PortSpec::udp(4500), PortSpec::udp(4490)]);

    cloud
        .prepare_for_submariner(&input, &reporter)
        .await
        .expect("prepare succeeds");

    assert_eq!(
        reporter.events(),
        vec![
            ReportEvent::Started("Opening ports".to_string()),
            ReportEvent::Succeeded("Opened ports 4500/udp, 4490/udp".to_string()),
        ]
    );
    assert_eq!(cloud.executed(), StepCloud::STEPS);
}

#[tokio::test]
async fn failing_step_stops_the_operation() {
    let cloud = StepCloud::new(Some(1));
    let observer = StepCloud::sharing_counters_with(&cloud);
    let reporter = RecordingReporter::new();

    let err = cloud
        .cleanup_after_submariner(&reporter)
        .await
        .expect_err("cleanup fails");

    // Steps 0 and 1 ran, step 2 did not
    assert_eq!(observer.executed(), 2);
    assert_eq!(reporter.failure_count(), 1);
    assert_eq!(reporter.last(), Some(ReportEvent::Failed(err.to_string())));
    assert!(
        !reporter
            .events()
            .iter()
            .any(|e| matches!(e, ReportEvent::Succeeded(_)))
    );
}
