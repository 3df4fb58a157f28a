//! User notifications raised by SDK flows.
//!
//! Flows such as matching or location search report their outcome to the
//! user through an injected [Notify] implementation rather than printing.

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Info(String),
    Error(String),
}

impl Notification {
    pub fn success(msg: impl Display) -> Self {
        Notification::Success(msg.to_string())
    }

    pub fn info(msg: impl Display) -> Self {
        Notification::Info(msg.to_string())
    }

    pub fn error(msg: impl Display) -> Self {
        Notification::Error(msg.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Notification::Success(msg) | Notification::Info(msg) | Notification::Error(msg) => msg,
        }
    }
}

pub trait Notify: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notify for Silent {
    fn notify(&self, _notification: Notification) {}
}

#[cfg(any(test, feature = "tests"))]
pub use recording::RecordingNotifier;

#[cfg(any(test, feature = "tests"))]
mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every notification for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications.lock().unwrap().clone()
        }
    }

    impl Notify for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.notifications.lock().unwrap().push(notification);
        }
    }
}
