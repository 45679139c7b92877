//! Replaying adapter for the `CourseRegistry` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{CourseRegistry, RealmUsername};

/// Serves recorded course registry reads from a cassette.
pub struct ReplayingCourseRegistry {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingCourseRegistry {
    /// Creates a replaying registry backed by `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl CourseRegistry for ReplayingCourseRegistry {
    fn registered_students(
        &self,
        _semester: &str,
        _distance: bool,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "registry", "registered_students"))
    }

    fn course_participants(
        &self,
        _course: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "registry", "course_participants"))
    }

    fn person_usernames(
        &self,
        _person: &str,
    ) -> Result<Vec<RealmUsername>, Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "registry", "person_usernames"))
    }
}
