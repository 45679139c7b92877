//! Recording adapter for the `Clock` port.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::record_interaction;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::Clock;

/// Records clock reads while delegating to an inner clock.
pub struct RecordingClock {
    inner: Box<dyn Clock>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingClock {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn Clock>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl Clock for RecordingClock {
    fn today(&self) -> NaiveDate {
        let today = self.inner.today();
        record_interaction(&self.recorder, "clock", "today", &serde_json::json!({}), &today);
        today
    }
}
