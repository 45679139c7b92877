//! Resolver backed by the course registration API.

use std::collections::BTreeSet;

use tracing::debug;

use super::terms;
use super::{MembershipSet, Resolver};
use crate::error::{Error, Result};
use crate::ports::{Clock, CourseRegistry};

/// Parsed course-registry query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseQuery {
    /// Everyone registered during the rolling term window.
    Students,
    /// Participants of one course segment.
    Course(String),
}

impl CourseQuery {
    /// Parses `students` or `course:<id>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for any other query.
    pub fn parse(query: &str) -> Result<Self> {
        if query == "students" {
            return Ok(Self::Students);
        }
        match query.strip_prefix("course:") {
            Some(id) if !id.is_empty() => Ok(Self::Course(id.to_string())),
            _ => Err(Error::Config(format!("invalid course registry query: {query}"))),
        }
    }
}

/// Resolves course-registry queries to realm-scoped usernames.
pub struct CourseRegistryResolver<'a> {
    registry: &'a dyn CourseRegistry,
    clock: &'a dyn Clock,
    realm: String,
}

impl<'a> CourseRegistryResolver<'a> {
    /// Creates a resolver keeping only usernames in `realm`.
    #[must_use]
    pub fn new(registry: &'a dyn CourseRegistry, clock: &'a dyn Clock, realm: &str) -> Self {
        Self { registry, clock, realm: realm.to_string() }
    }

    fn current_students(&self) -> Result<MembershipSet> {
        let mut students = MembershipSet::new();
        for term in terms::window(self.clock.today()) {
            let code = term.to_string();
            for distance in [false, true] {
                let registered = self
                    .registry
                    .registered_students(&code, distance)
                    .map_err(|e| Error::Resolve(format!("registered students for {code}: {e}")))?;
                students.extend(registered);
            }
        }
        debug!(count = students.len(), "resolved active students");
        Ok(students)
    }

    fn course_participants(&self, course: &str) -> Result<MembershipSet> {
        let people: BTreeSet<String> = self
            .registry
            .course_participants(course)
            .map_err(|e| Error::Resolve(format!("participants of course {course}: {e}")))?
            .into_iter()
            .collect();

        let mut usernames = MembershipSet::new();
        for person in &people {
            let identities = self
                .registry
                .person_usernames(person)
                .map_err(|e| Error::Resolve(format!("usernames of person {person}: {e}")))?;
            usernames.extend(
                identities.into_iter().filter(|id| id.realm == self.realm).map(|id| id.username),
            );
        }
        Ok(usernames)
    }
}

impl Resolver for CourseRegistryResolver<'_> {
    fn resolve(&self, query: &str) -> Result<MembershipSet> {
        match CourseQuery::parse(query)? {
            CourseQuery::Students => self.current_students(),
            CourseQuery::Course(id) => self.course_participants(&id),
        }
    }
}
