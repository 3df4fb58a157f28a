use std::fmt::Display;

use pawmatch_sdk::notify::{Notification, Notify};

/// Write a message to stderr.
///
/// This is a wrapper around `eprintln!` that can be further extended
/// to include logging, word wrapping, ANSI filtering etc.
fn print_message(v: impl Display) {
    #[cfg(test)]
    {
        let history = crate::utils::message::history::History::global();
        history.push_message(format!("{v}"));
    }

    eprintln!("{v}");
}

/// alias for [print_message]
pub(crate) fn plain(v: impl Display) {
    print_message(v);
}
pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("❌ ERROR: {v}"));
}
pub(crate) fn created(v: impl Display) {
    print_message(std::format_args!("✨ {v}"));
}
/// double width character, add an additional space for alignment
pub(crate) fn deleted(v: impl Display) {
    print_message(std::format_args!("🗑️  {v}"));
}
pub(crate) fn updated(v: impl Display) {
    print_message(std::format_args!("✅ {v}"));
}
/// double width character, add an additional space for alignment
pub(crate) fn warning(v: impl Display) {
    print_message(std::format_args!("⚠️  {v}"));
}
pub(crate) fn info(v: impl Display) {
    print_message(std::format_args!("ℹ️  {v}"));
}

/// Shows notifications raised by SDK flows as messages.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Notifier;

impl Notify for Notifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(msg) => created(msg),
            Notification::Info(msg) => info(msg),
            Notification::Error(msg) => error(msg),
        }
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::history::History;
    use super::*;

    #[test]
    fn notifications_are_shown_as_messages() {
        let history = History::global();
        history.clear();

        Notifier.notify(Notification::success("It's a match!"));
        Notifier.notify(Notification::info("No match found."));
        Notifier.notify(Notification::error("Failed to find a match"));

        assert_eq!(history.messages(), [
            "✨ It's a match!",
            "ℹ️  No match found.",
            "❌ ERROR: Failed to find a match",
        ]);
    }
}
