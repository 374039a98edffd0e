//! Human-readable progress notifications from long-running client calls

use log::info;

/// Receives one-line status messages while bulk calls run
pub trait ProgressSink: Send + Sync {
    fn emit(&self, message: &str);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _message: &str) {}
}

/// Forwards messages to the `log` facade at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&self, message: &str) {
        info!("{}", message);
    }
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, message: &str) {
        self(message)
    }
}
