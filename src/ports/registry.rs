//! Course registry port.

use serde::{Deserialize, Serialize};

/// A username qualified by the realm it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmUsername {
    /// Identity namespace, e.g. `EXAMPLE.ORG`.
    pub realm: String,
    /// Username within the realm.
    pub username: String,
}

/// Read access to the course registration API.
pub trait CourseRegistry: Send + Sync {
    /// Lists usernames registered in `semester` (e.g. `"20232"`).
    ///
    /// `distance` selects the off-campus variant of the registration list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unavailable or answers unexpectedly.
    fn registered_students(
        &self,
        semester: &str,
        distance: bool,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;

    /// Lists the person identifiers participating in a course segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unavailable or answers unexpectedly.
    fn course_participants(
        &self,
        course: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;

    /// Lists every username a person holds, across realms.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unavailable or answers unexpectedly.
    fn person_usernames(
        &self,
        person: &str,
    ) -> Result<Vec<RealmUsername>, Box<dyn std::error::Error + Send + Sync>>;
}
