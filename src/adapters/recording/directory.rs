//! Recording adapter for the `Directory` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::Directory;

/// Records directory searches while delegating to an inner directory.
pub struct RecordingDirectory {
    inner: Box<dyn Directory>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingDirectory {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn Directory>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct SearchInput<'a> {
    filter: &'a str,
}

impl Directory for RecordingDirectory {
    fn connect(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.connect()
    }

    fn search(&self, filter: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.search(filter);
        record_result(&self.recorder, "directory", "search", &SearchInput { filter }, &result);
        result
    }
}
