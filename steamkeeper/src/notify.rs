//! Operator-facing status notifications.
//!
//! The pipeline reports a one-line summary of each run. Where that line ends
//! up (the log, a console, a chat bridge) is decided by the caller through
//! [`StatusNotifier`].

use tracing::{error, info};

use crate::updater::PipelineOutcome;

/// Receives plain-text status lines.
pub trait StatusNotifier: Send + Sync {
    /// Deliver a success or informational message.
    fn notify(&self, message: &str);

    /// Deliver a failure message. Defaults to [`StatusNotifier::notify`].
    fn notify_failure(&self, message: &str) {
        self.notify(message);
    }
}

/// Forwards status lines to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl StatusNotifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(target: "steamkeeper::status", "{}", message);
    }

    fn notify_failure(&self, message: &str) {
        error!(target: "steamkeeper::status", "{}", message);
    }
}

/// Send the outcome summary of a pipeline run to a notifier.
///
/// Returns the summary that was sent.
pub fn report_outcome(notifier: &dyn StatusNotifier, outcome: &PipelineOutcome) -> String {
    let summary = outcome.summary();
    if outcome.is_success() {
        notifier.notify(&summary);
    } else {
        notifier.notify_failure(&summary);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::{InstallStatus, Platform, UpdaterError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<(bool, String)>>,
    }

    impl StatusNotifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((true, message.to_string()));
        }

        fn notify_failure(&self, message: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((false, message.to_string()));
        }
    }

    #[test]
    fn test_success_is_reported_as_notification() {
        let notifier = RecordingNotifier::default();
        let outcome = PipelineOutcome {
            platform: Platform::Linux,
            install: Ok(InstallStatus::AlreadyInstalled),
            invocation: Some(Ok(())),
        };

        let summary = report_outcome(&notifier, &outcome);

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].0);
        assert_eq!(messages[0].1, summary);
    }

    #[test]
    fn test_install_failure_is_reported_as_failure() {
        let notifier = RecordingNotifier::default();
        let outcome = PipelineOutcome {
            platform: Platform::Windows,
            install: Err(UpdaterError::HttpStatusFailure {
                url: "https://example.invalid/steamcmd.zip".to_string(),
                status: 503,
            }),
            invocation: None,
        };

        report_outcome(&notifier, &outcome);

        let messages = notifier.messages.lock().unwrap();
        assert!(!messages[0].0);
        assert!(messages[0].1.contains("Windows"));
        assert!(messages[0].1.contains("503"));
    }

    #[test]
    fn test_default_failure_falls_back_to_notify() {
        struct Plain(Mutex<Vec<String>>);
        impl StatusNotifier for Plain {
            fn notify(&self, message: &str) {
                self.0.lock().unwrap().push(message.to_string());
            }
        }

        let notifier = Plain(Mutex::new(Vec::new()));
        notifier.notify_failure("boom");
        assert_eq!(*notifier.0.lock().unwrap(), vec!["boom".to_string()]);
    }
}
