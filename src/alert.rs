//! User-facing alerting collaborator.
//!
//! One fire-and-forget operation; every user-visible failure of a run goes
//! through it exactly once. The host application wires in whatever sink it
//! has (toast, mail, stderr); the default just uses the log facade.

use log::error;

pub trait AlertSink {
    fn alert(&self, message: &str);
}

/// Default sink: alerts land in the error log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlert;

impl AlertSink for LogAlert {
    fn alert(&self, message: &str) {
        error!("alert: {message}");
    }
}
