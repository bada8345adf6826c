//! Fire-and-forget user notifications.
//!
//! The stores surface every user-visible outcome through this interface;
//! how a notice is rendered (toast, terminal line) is the presentation
//! layer's business.

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }
}

/// Consumer of notices. Calls are fire-and-forget: a notifier must not
/// fail and must not block the calling operation.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that emits notices through `tracing`. Used by the CLI.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => {
                tracing::info!(title = %notice.title, "{}", notice.description)
            }
            Severity::Error => {
                tracing::error!(title = %notice.title, "{}", notice.description)
            }
        }
    }
}

/// Notifier that records notices for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    notices: std::sync::Mutex<Vec<Notice>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap().last().cloned()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_constructors() {
        let n = Notice::info("List created", "\"Groceries\" was created.");
        assert_eq!(n.severity, Severity::Info);

        let n = Notice::error("Could not load lists", "try again");
        assert_eq!(n.severity, Severity::Error);
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::default();
        notifier.notify(Notice::info("a", "b"));
        notifier.notify(Notice::error("c", "d"));

        assert_eq!(notifier.notices().len(), 2);
        assert_eq!(notifier.last().unwrap().title, "c");
    }
}
