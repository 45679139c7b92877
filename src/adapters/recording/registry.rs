//! Recording adapter for the `CourseRegistry` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CourseRegistry, RealmUsername};

/// Records course registry reads while delegating to an inner client.
pub struct RecordingCourseRegistry {
    inner: Box<dyn CourseRegistry>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingCourseRegistry {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn CourseRegistry>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct SemesterInput<'a> {
    semester: &'a str,
    distance: bool,
}

#[derive(Serialize)]
struct CourseInput<'a> {
    course: &'a str,
}

#[derive(Serialize)]
struct PersonInput<'a> {
    person: &'a str,
}

impl CourseRegistry for RecordingCourseRegistry {
    fn registered_students(
        &self,
        semester: &str,
        distance: bool,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.registered_students(semester, distance);
        let input = SemesterInput { semester, distance };
        record_result(&self.recorder, "registry", "registered_students", &input, &result);
        result
    }

    fn course_participants(
        &self,
        course: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.course_participants(course);
        let input = CourseInput { course };
        record_result(&self.recorder, "registry", "course_participants", &input, &result);
        result
    }

    fn person_usernames(
        &self,
        person: &str,
    ) -> Result<Vec<RealmUsername>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.person_usernames(person);
        let input = PersonInput { person };
        record_result(&self.recorder, "registry", "person_usernames", &input, &result);
        result
    }
}
