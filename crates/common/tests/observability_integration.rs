//! Integration tests for the process-wide error sink
//!
//! Runs in its own test binary so swapping the global handler cannot
//! interfere with unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dynmetric_common::{handle, set_error_handler, ErrorHandler, RecordingErrorHandler};
use dynmetric_domain::DynMetricError;

#[test]
fn test_global_sink_routes_and_restores() {
    let recorder = Arc::new(RecordingErrorHandler::new());
    let previous = set_error_handler(recorder.clone());

    handle(&DynMetricError::Export("sink unavailable".into()));
    handle(&DynMetricError::Collection("round not started".into()));

    assert_eq!(
        recorder.flush(),
        vec![
            DynMetricError::Export("sink unavailable".into()),
            DynMetricError::Collection("round not started".into()),
        ]
    );

    // closures are handlers too
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let replaced = set_error_handler(Arc::new(move |_: &DynMetricError| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));
    handle(&DynMetricError::Internal("x".into()));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(recorder.is_empty());

    replaced.handle(&DynMetricError::Internal("direct".into()));
    assert_eq!(recorder.len(), 1);

    set_error_handler(previous);
}
