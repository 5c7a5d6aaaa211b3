//! # Classifier Module
//!
//! Maps store-layer errors onto a closed set of caller-facing outcomes.
//!
//! Classification is total: anything a classifier cannot place becomes
//! [`OutcomeStatus::Internal`]. Classifiers never log; logging the original
//! error next to the derived reason is the caller's job.
//!
//! Stores plug in their own rules in one of two ways:
//! - implement [`StoreErrorKind`] on the store's error type and use
//!   [`KindClassifier`]
//! - supply any `Fn(&E) -> ClassifiedOutcome` as the classifier

use serde::Serialize;
use std::{fmt, io};

/// Caller-facing outcome of a failed store call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    NotFound,
    AlreadyExists,
    InvalidInput,
    Forbidden,
    /// Store temporarily unreachable; the caller may retry
    Unavailable,
    Internal,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::InvalidInput => "invalid_input",
            Self::Forbidden => "forbidden",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }

    /// Check if the outcome is transient and a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome kind plus a diagnostic reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedOutcome {
    pub status: OutcomeStatus,
    pub reason: String,
}

impl ClassifiedOutcome {
    pub fn new(status: OutcomeStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Internal, reason)
    }
}

/// Store errors that can be asked for their outcome kind
///
/// Returning `None` means the error has no known kind; it is classified as
/// `Internal`.
pub trait StoreErrorKind {
    fn outcome_status(&self) -> Option<OutcomeStatus>;
}

/// Maps one store's error type onto outcomes
pub trait ErrorClassifier<E: ?Sized>: Send + Sync {
    fn classify(&self, error: &E) -> ClassifiedOutcome;
}

impl<E, F> ErrorClassifier<E> for F
where
    E: ?Sized,
    F: Fn(&E) -> ClassifiedOutcome + Send + Sync,
{
    fn classify(&self, error: &E) -> ClassifiedOutcome {
        self(error)
    }
}

/// Classifier for any error implementing [`StoreErrorKind`]
#[derive(Debug, Clone, Copy, Default)]
pub struct KindClassifier;

impl<E> ErrorClassifier<E> for KindClassifier
where
    E: StoreErrorKind + fmt::Display + ?Sized,
{
    fn classify(&self, error: &E) -> ClassifiedOutcome {
        let status = error.outcome_status().unwrap_or(OutcomeStatus::Internal);
        ClassifiedOutcome::new(status, error.to_string())
    }
}

impl StoreErrorKind for io::Error {
    fn outcome_status(&self) -> Option<OutcomeStatus> {
        match self.kind() {
            io::ErrorKind::NotFound => Some(OutcomeStatus::NotFound),
            io::ErrorKind::AlreadyExists => Some(OutcomeStatus::AlreadyExists),
            io::ErrorKind::PermissionDenied => Some(OutcomeStatus::Forbidden),
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => {
                Some(OutcomeStatus::InvalidInput)
            }
            io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => {
                Some(OutcomeStatus::Unavailable)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
