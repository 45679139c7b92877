//! Live adapter for the course registry REST API.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::runtime::Runtime;

use crate::config::RegistrySettings;
use crate::ports::registry::{CourseRegistry, RealmUsername};

/// Course registry client using basic credentials.
///
/// Requests are issued one at a time on a private current-thread runtime.
pub struct LiveCourseRegistry {
    client: Client,
    runtime: Runtime,
    base: Url,
    user: String,
    password: String,
    department: u32,
    realm: String,
}

/// One entry of a course segment's participant list.
#[derive(Deserialize)]
struct Participant {
    person: Person,
}

/// The person behind a participant entry.
#[derive(Deserialize)]
struct Person {
    id: serde_json::Value,
}

impl LiveCourseRegistry {
    /// Creates a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot carry a path or the async runtime
    /// cannot be started.
    pub fn new(
        settings: &RegistrySettings,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let base = Url::parse(&settings.url)?;
        if base.cannot_be_a_base() {
            return Err(format!("course registry URL cannot be a base: {}", settings.url).into());
        }
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            client: Client::new(),
            runtime,
            base,
            user: settings.user.clone(),
            password: settings.password.clone(),
            department: settings.department,
            realm: settings.realm.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
        self.runtime.block_on(self.fetch(self.endpoint(segments), query))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
        let path = url.path().to_string();
        let response = self
            .client
            .get(url)
            .query(query)
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("course registry request failed: {e}"))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(format!("course registry answered {} for {path}", status.as_u16()).into());
        }
        response.json::<T>().await.map_err(|e| format!("invalid course registry response: {e}").into())
    }
}

impl CourseRegistry for LiveCourseRegistry {
    fn registered_students(
        &self,
        semester: &str,
        distance: bool,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let mut query = vec![
            ("department", self.department.to_string()),
            ("realm", self.realm.clone()),
            ("includeReregs", "true".to_string()),
            ("semester", semester.to_string()),
        ];
        if distance {
            query.push(("distance", "true".to_string()));
        }
        self.get(&["student", "registeredStudents"], &query)
    }

    fn course_participants(
        &self,
        course: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let participants: Vec<Participant> =
            self.get(&["courseSegment", course, "participants"], &[])?;
        Ok(participants
            .into_iter()
            .map(|p| match p.person.id {
                serde_json::Value::String(id) => id,
                other => other.to_string(),
            })
            .collect())
    }

    fn person_usernames(
        &self,
        person: &str,
    ) -> Result<Vec<RealmUsername>, Box<dyn std::error::Error + Send + Sync>> {
        self.get(&["person", person, "usernames"], &[])
    }
}
