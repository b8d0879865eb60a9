//! Process-wide error sink
//!
//! Runtime failures that have no caller to return to (export and collection
//! errors inside a background tick) are routed here. The default handler
//! logs through `tracing`; applications and tests may install their own.

use std::fmt;
use std::sync::Arc;

use dynmetric_domain::DynMetricError;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

/// Receives errors that cannot be returned to a caller
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, err: &DynMetricError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&DynMetricError) + Send + Sync,
{
    fn handle(&self, err: &DynMetricError) {
        self(err);
    }
}

/// Default handler: one `tracing` event per error
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn handle(&self, err: &DynMetricError) {
        match err {
            DynMetricError::InvariantViolation(_) | DynMetricError::Internal(_) => {
                tracing::error!(error_type = err.label(), error = %err, "dynmetric error");
            }
            _ => {
                tracing::warn!(error_type = err.label(), error = %err, "dynmetric error");
            }
        }
    }
}

static GLOBAL_HANDLER: Lazy<RwLock<Arc<dyn ErrorHandler>>> =
    Lazy::new(|| RwLock::new(Arc::new(LoggingErrorHandler)));

/// Install `handler` as the process-wide sink, returning the previous one.
pub fn set_error_handler(handler: Arc<dyn ErrorHandler>) -> Arc<dyn ErrorHandler> {
    std::mem::replace(&mut *GLOBAL_HANDLER.write(), handler)
}

/// Current process-wide sink
pub fn error_handler() -> Arc<dyn ErrorHandler> {
    Arc::clone(&GLOBAL_HANDLER.read())
}

/// Route `err` to the process-wide sink.
pub fn handle(err: &DynMetricError) {
    error_handler().handle(err);
}

/// Stores every error it receives; for tests.
#[derive(Default)]
pub struct RecordingErrorHandler {
    errors: Mutex<Vec<DynMetricError>>,
}

impl RecordingErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return the recorded errors.
    pub fn flush(&self) -> Vec<DynMetricError> {
        std::mem::take(&mut *self.errors.lock())
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn handle(&self, err: &DynMetricError) {
        self.errors.lock().push(err.clone());
    }
}

impl fmt::Debug for RecordingErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingErrorHandler").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_handler_flush_drains() {
        let recorder = RecordingErrorHandler::new();
        recorder.handle(&DynMetricError::Export("a".into()));
        recorder.handle(&DynMetricError::Collection("b".into()));

        assert_eq!(recorder.len(), 2);
        let errors = recorder.flush();
        assert_eq!(errors[0], DynMetricError::Export("a".into()));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_global_handler_swap() {
        let recorder = Arc::new(RecordingErrorHandler::new());
        let previous = set_error_handler(recorder.clone());

        handle(&DynMetricError::Export("boom".into()));
        set_error_handler(previous);
        handle(&DynMetricError::Export("after restore".into()));

        assert_eq!(recorder.flush(), vec![DynMetricError::Export("boom".into())]);
    }

    #[test]
    fn test_closure_handler() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        let handler = move |_: &DynMetricError| *counter.lock() += 1;

        handler.handle(&DynMetricError::Transport("down".into()));
        assert_eq!(*seen.lock(), 1);
    }
}
