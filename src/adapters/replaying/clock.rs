//! Replaying adapter for the `Clock` port.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::next_output;
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::Clock;

/// Serves recorded dates from a cassette.
pub struct ReplayingClock {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingClock {
    /// Creates a replaying clock backed by `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl Clock for ReplayingClock {
    fn today(&self) -> NaiveDate {
        let output = next_output(&self.replayer, "clock", "today");
        serde_json::from_value(output).expect("clock::today: recorded value is not a date")
    }
}
