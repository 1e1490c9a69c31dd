//! Transient user-facing notices

use busline_core::effect::Effect;
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a notice
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Neutral information
    Info,
    /// Something completed
    Success,
    /// Validation or backend failure
    Error,
}

/// A short notification: title plus one line of detail
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Headline
    pub title: String,
    /// Detail line
    pub description: String,
}

impl Notice {
    fn new(level: NoticeLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Informational notice
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, description)
    }

    /// Success notice
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, description)
    }

    /// Error notice
    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, description)
    }
}

/// Where notices go
pub trait Notifier: Send + Sync {
    /// Deliver a notice
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let Notice {
            level,
            title,
            description,
        } = notice;
        match level {
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(target: "busline::notice", %title, %description);
            },
            NoticeLevel::Error => tracing::warn!(target: "busline::notice", %title, %description),
        }
    }
}

/// Keeps every notice for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Titles received so far
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

/// Effect that delivers `notice` and produces no action
pub fn notify<A: Send + 'static>(notifier: &Arc<dyn Notifier>, notice: Notice) -> Effect<A> {
    let notifier = Arc::clone(notifier);
    busline_core::fire_and_forget! {
        notifier.notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_effect_delivers_on_execution() {
        let recorder = Arc::new(RecordingNotifier::new());
        let notifier: Arc<dyn Notifier> = recorder.clone();

        let effect: Effect<()> = notify(&notifier, Notice::error("Search Error", "Please select both origin and destination"));
        assert!(recorder.notices().is_empty());

        let Effect::Future(fut) = effect else {
            unreachable!("notify builds a future effect");
        };
        assert_eq!(fut.await, None);
        assert_eq!(recorder.titles(), vec!["Search Error".to_string()]);
    }
}
