//! Error-reporting collaborator.

use std::error::Error;
use std::sync::Mutex;

/// Fire-and-forget sink for failures the core recovers from.
///
/// The UI layer typically turns these into transient notifications.
pub trait ErrorReporter: Send + Sync {
    fn log_error(&self, error: &(dyn Error + 'static), context: Option<&str>);
}

/// Reporter that forwards to `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn log_error(&self, error: &(dyn Error + 'static), context: Option<&str>) {
        tracing::error!(error = %error, context = context.unwrap_or(""), "Reported error");
    }
}

/// Reporter that remembers every message, for tests and diagnostics panels.
#[derive(Debug, Default)]
pub struct CollectingErrorReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far, formatted as `context: error`.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ErrorReporter for CollectingErrorReporter {
    fn log_error(&self, error: &(dyn Error + 'static), context: Option<&str>) {
        let line = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };
        match self.messages.lock() {
            Ok(mut guard) => guard.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommonError;

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingErrorReporter::new();
        reporter.log_error(&CommonError::LevelNotFound(2), Some("index"));
        reporter.log_error(&CommonError::UnknownGridType("x".into()), None);

        let messages = reporter.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "index: Dataset index level 2 does not exist");
        assert_eq!(messages[1], "Unknown grid type: x");
    }
}
