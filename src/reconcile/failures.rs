//! Failures collected during a run.

use std::fmt;

use super::Operation;

/// One operation that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Entitlement being reconciled.
    pub entitlement: String,
    /// What was attempted.
    pub operation: Operation,
    /// Affected user, absent when a whole entitlement could not be resolved.
    pub user: Option<String>,
    /// Reason reported by the failing component.
    pub cause: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entitlement, self.operation)?;
        if let Some(user) = &self.user {
            write!(f, " {user}")?;
        }
        write!(f, ": {}", self.cause)
    }
}

/// Accumulates [`FailureRecord`]s in the order they occur.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureCollector {
    records: Vec<FailureRecord>,
}

impl FailureCollector {
    /// Adds a failure.
    pub fn record(
        &mut self,
        entitlement: &str,
        operation: Operation,
        user: Option<&str>,
        cause: impl Into<String>,
    ) {
        self.records.push(FailureRecord {
            entitlement: entitlement.to_string(),
            operation,
            user: user.map(str::to_string),
            cause: cause.into(),
        });
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Failures in occurrence order.
    pub fn iter(&self) -> std::slice::Iter<'_, FailureRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a FailureCollector {
    type Item = &'a FailureRecord;
    type IntoIter = std::slice::Iter<'a, FailureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for FailureCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}
