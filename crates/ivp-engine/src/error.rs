//! Engine error taxonomy.
//!
//! Structural failures (`ConfigurationError`, `CalendarUnavailable`,
//! `SlotMismatch`) propagate to the caller as explicit values. Per-sample
//! defects (`UnalignedSample`) are normally absorbed by the builder and only
//! surface here once a threshold says the feed itself is misconfigured.
//!
//! "Window not ready" is deliberately absent: it is an expected state, see
//! [`crate::WindowStatus::NotReady`].

use std::fmt;

/// Error category. Callers branch on this, never on the message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The trading calendar could not resolve the requested day list.
    CalendarUnavailable,
    /// A daily series does not match the canonical slot grid.
    SlotMismatch,
    /// A sample timestamp does not fall on any canonical slot.
    UnalignedSample,
    /// Slot grid or engine parameters are invalid.
    ConfigurationError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CalendarUnavailable => "CALENDAR_UNAVAILABLE",
            ErrorKind::SlotMismatch => "SLOT_MISMATCH",
            ErrorKind::UnalignedSample => "UNALIGNED_SAMPLE",
            ErrorKind::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::ConfigurationError, message)
    }

    pub fn slot_mismatch<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::SlotMismatch, message)
    }

    pub fn unaligned_sample<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::UnalignedSample, message)
    }

    pub fn calendar_unavailable<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::CalendarUnavailable, message)
    }

    /// Fatal errors end the calling session; the rest reject a single
    /// operation and leave engine state untouched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ConfigurationError | ErrorKind::CalendarUnavailable
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let e = EngineError::slot_mismatch("expected 48 slots, got 40");
        assert_eq!(e.to_string(), "SLOT_MISMATCH: expected 48 slots, got 40");
    }

    #[test]
    fn fatal_classification() {
        assert!(EngineError::configuration("x").is_fatal());
        assert!(EngineError::calendar_unavailable("x").is_fatal());
        assert!(!EngineError::slot_mismatch("x").is_fatal());
        assert!(!EngineError::unaligned_sample("x").is_fatal());
    }
}
