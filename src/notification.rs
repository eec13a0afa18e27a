//! Notification payloads handed to integrations.

use std::fmt;

use serde::Serialize;

use crate::error::TesterError;

/// Which integration entry point a notification is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A tester returned `false` for an element.
    Element,
    /// A tester raised an error for an element.
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Element => f.write_str("element"),
            NotificationKind::Error => f.write_str("error"),
        }
    }
}

/// Payload describing one failed check.
///
/// Built per failure and never persisted. Serializes with the keys
/// `test_name`, `expect_function`, `element` and, when present, `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification<T> {
    /// Description of the test group, taken from its integration binding.
    #[serde(rename = "test_name")]
    pub description: String,
    /// Name of the tester that failed.
    #[serde(rename = "expect_function")]
    pub tester: String,
    /// The element that failed the check.
    pub element: T,
    /// Present when the tester raised instead of returning `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TesterError>,
}

impl<T> Notification<T> {
    /// Payload for an element that failed a tester.
    pub fn new(description: impl Into<String>, tester: impl Into<String>, element: T) -> Self {
        Self {
            description: description.into(),
            tester: tester.into(),
            element,
            error: None,
        }
    }

    /// Attach the error raised by the tester.
    pub fn with_error(mut self, error: TesterError) -> Self {
        self.error = Some(error);
        self
    }

    /// Entry point this payload belongs to.
    pub fn kind(&self) -> NotificationKind {
        if self.error.is_some() {
            NotificationKind::Error
        } else {
            NotificationKind::Element
        }
    }
}

impl<T: fmt::Debug> Notification<T> {
    /// One-line summary suitable for logs or chat messages.
    pub fn describe(&self) -> String {
        match &self.error {
            Some(err) => format!(
                "{}: {} raised on {:?}: {}",
                self.description, self.tester, self.element, err
            ),
            None => format!(
                "{}: {} failed on {:?}",
                self.description, self.tester, self.element
            ),
        }
    }
}
