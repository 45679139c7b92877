//! Replaying adapter for the `Directory` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::Directory;

/// Serves recorded directory searches from a cassette.
pub struct ReplayingDirectory {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingDirectory {
    /// Creates a replaying directory backed by `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl Directory for ReplayingDirectory {
    fn search(&self, _filter: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "directory", "search"))
    }
}
