//! Status reporting: the narrow sink every component writes user-facing
//! messages to.
//!
//! Rendering is up to the implementor.  [`LogReporter`] just forwards to the
//! `log` facade and is what the headless paths use.

/// How a status message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// Receives one human-readable message per reportable event.
pub trait StatusReporter: Send + Sync {
    fn report(&self, message: &str, severity: Severity);
}

/// Writes status messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => log::error!("status: {message}"),
            Severity::Info | Severity::Success => log::info!("status: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Info.label(), "info");
        assert_eq!(Severity::Success.label(), "success");
        assert_eq!(Severity::Error.label(), "error");
    }

    #[test]
    fn log_reporter_is_object_safe() {
        let reporter: Box<dyn StatusReporter> = Box::new(LogReporter);
        reporter.report("hello", Severity::Info);
    }
}
