//! Clock port for obtaining the current date.

use chrono::NaiveDate;

/// Provides the current local date.
///
/// Abstracting time access allows deterministic replay by substituting
/// a fixed or recorded clock during tests and cassette playback.
pub trait Clock: Send + Sync {
    /// Returns today's date in the local time zone.
    fn today(&self) -> NaiveDate;
}
