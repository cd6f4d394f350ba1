//! Informational reports about unresolvable board data.

use std::{cell::RefCell, collections::HashSet, fmt};

/// Describes referenced data that could not be resolved.
///
/// Reports never abort the operation that raised them; the caller degrades
/// gracefully and files the report with a [`BadDataLog`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BadDataReport {
    message: String,
    data: String,
}

impl BadDataReport {
    /// Creates a report for `data` with a human-readable explanation.
    #[must_use]
    pub fn new(message: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: data.into(),
        }
    }

    /// Explanation of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The offending data reference, such as an image name.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl fmt::Display for BadDataReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message, self.data)
    }
}

/// Collects bad-data reports, logging each distinct report once.
#[derive(Debug, Default)]
pub struct BadDataLog {
    reports: RefCell<Vec<BadDataReport>>,
    seen: RefCell<HashSet<BadDataReport>>,
}

impl BadDataLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a report, returning `true` when it had not been seen before.
    pub fn report(&self, report: BadDataReport) -> bool {
        if !self.seen.borrow_mut().insert(report.clone()) {
            return false;
        }
        tracing::warn!(reason = %report.message, data = %report.data, "bad data");
        self.reports.borrow_mut().push(report);
        true
    }

    /// Distinct reports filed so far, in filing order.
    #[must_use]
    pub fn reports(&self) -> Vec<BadDataReport> {
        self.reports.borrow().clone()
    }

    /// Returns `true` when no report has been filed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }
}
