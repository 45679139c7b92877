//! Academic term arithmetic for the rolling window of active students.
//!
//! The academic year has two halves. A date in July or later belongs to the
//! second half of its calendar year, anything earlier to the first. Terms are
//! encoded as year followed by half, so the autumn of 2023 is `20232`.

use std::fmt;
use std::iter;

use chrono::{Datelike, NaiveDate};

/// Number of terms a student stays "active" after registering.
pub const WINDOW: usize = 10;

/// Half of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Half {
    /// January through June.
    First = 1,
    /// July through December.
    Second = 2,
}

/// One academic term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    /// Calendar year.
    pub year: i32,
    /// Half of the year.
    pub half: Half,
}

impl Term {
    /// The term `date` falls in.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let half = if date.month() >= 7 { Half::Second } else { Half::First };
        Self { year: date.year(), half }
    }

    /// The term immediately before this one.
    #[must_use]
    pub fn previous(self) -> Self {
        match self.half {
            Half::Second => Self { year: self.year, half: Half::First },
            Half::First => Self { year: self.year - 1, half: Half::Second },
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.year, self.half as u8)
    }
}

/// The current term followed by the preceding ones, newest first.
#[must_use]
pub fn window(today: NaiveDate) -> Vec<Term> {
    iter::successors(Some(Term::containing(today)), |term| Some(term.previous()))
        .take(WINDOW)
        .collect()
}
