//! In-memory port implementations shared by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::config::Settings;
use crate::ports::{
    Clock, CourseRegistry, Directory, EntitlementService, FileSystem, RealmUsername, Ticket,
    TicketIssuer, TicketRequest,
};

type PortResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const SETTINGS: &str = r"
entitlement_base: 'urn:mace:example.org:'
mapping_file: entmap.conf
directory:
  url: ldap://localhost
  bind_dn: cn=test
  base_dn: dc=example,dc=org
course_registry:
  url: http://localhost/rest
  user: test
  department: 4
  realm: EXAMPLE.ORG
entitlement_api:
  url: http://localhost/api/user
  principal: test@EXAMPLE.ORG
  keytab: test.keytab
";

/// Settings with `urn:mace:example.org:` as entitlement base.
pub fn settings() -> Settings {
    Settings::from_yaml(SETTINGS, Path::new("/tmp")).expect("test settings parse")
}

/// Clock frozen on one date.
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self(NaiveDate::from_ymd_opt(year, month, day).expect("valid date"))
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Files held in memory. Counts replaces.
#[derive(Default)]
pub struct MemFs {
    files: Mutex<HashMap<PathBuf, String>>,
    writes: AtomicUsize,
}

impl MemFs {
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.files.lock().unwrap().insert(path.into(), contents.to_string());
        self
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl FileSystem for MemFs {
    fn read_to_string(&self, path: &Path) -> PortResult<String> {
        self.contents(path).ok_or_else(|| format!("{}: no such file", path.display()).into())
    }

    fn replace(&self, path: &Path, contents: &str) -> PortResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

/// Directory answering canned filters. Unknown filters match nothing.
#[derive(Default)]
pub struct FakeDirectory {
    down: Option<String>,
    results: HashMap<String, Result<Vec<String>, String>>,
    queries: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn with(mut self, filter: &str, users: &[&str]) -> Self {
        let users = users.iter().map(|u| (*u).to_string()).collect();
        self.results.insert(filter.to_string(), Ok(users));
        self
    }

    pub fn failing(mut self, filter: &str, message: &str) -> Self {
        self.results.insert(filter.to_string(), Err(message.to_string()));
        self
    }

    /// Refuses to connect or search.
    pub fn unreachable(mut self, message: &str) -> Self {
        self.down = Some(message.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Directory for FakeDirectory {
    fn connect(&self) -> PortResult<()> {
        match &self.down {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    fn search(&self, filter: &str) -> PortResult<Vec<String>> {
        self.queries.lock().unwrap().push(filter.to_string());
        self.connect()?;
        match self.results.get(filter) {
            Some(Ok(users)) => Ok(users.clone()),
            Some(Err(message)) => Err(message.clone().into()),
            None => Ok(Vec::new()),
        }
    }
}

/// Course registry with canned answers, logging every call.
#[derive(Default)]
pub struct FakeRegistry {
    students: HashMap<(String, bool), Vec<String>>,
    participants: HashMap<String, Vec<String>>,
    usernames: HashMap<String, Vec<RealmUsername>>,
    unavailable: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn with_students(mut self, semester: &str, distance: bool, users: &[&str]) -> Self {
        let users = users.iter().map(|u| (*u).to_string()).collect();
        self.students.insert((semester.to_string(), distance), users);
        self
    }

    pub fn with_participants(mut self, course: &str, people: &[&str]) -> Self {
        let people = people.iter().map(|p| (*p).to_string()).collect();
        self.participants.insert(course.to_string(), people);
        self
    }

    pub fn with_usernames(mut self, person: &str, names: &[(&str, &str)]) -> Self {
        let names = names
            .iter()
            .map(|(realm, username)| RealmUsername {
                realm: (*realm).to_string(),
                username: (*username).to_string(),
            })
            .collect();
        self.usernames.insert(person.to_string(), names);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, description: String) -> PortResult<()> {
        self.calls.lock().unwrap().push(description);
        if self.unavailable {
            return Err("registry unavailable".into());
        }
        Ok(())
    }
}

impl CourseRegistry for FakeRegistry {
    fn registered_students(&self, semester: &str, distance: bool) -> PortResult<Vec<String>> {
        let variant = if distance { "distance" } else { "campus" };
        self.call(format!("registered_students {semester} {variant}"))?;
        Ok(self.students.get(&(semester.to_string(), distance)).cloned().unwrap_or_default())
    }

    fn course_participants(&self, course: &str) -> PortResult<Vec<String>> {
        self.call(format!("course_participants {course}"))?;
        Ok(self.participants.get(course).cloned().unwrap_or_default())
    }

    fn person_usernames(&self, person: &str) -> PortResult<Vec<RealmUsername>> {
        self.call(format!("person_usernames {person}"))?;
        Ok(self.usernames.get(person).cloned().unwrap_or_default())
    }
}

/// Ticket issuer counting acquisitions and releases.
#[derive(Default)]
pub struct FakeIssuer {
    refuse: bool,
    keep_cache: bool,
    acquired: AtomicUsize,
    destroyed: AtomicUsize,
}

impl FakeIssuer {
    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// Every `destroy` fails after being counted.
    pub fn failing_destroy(mut self) -> Self {
        self.keep_cache = true;
        self
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl TicketIssuer for FakeIssuer {
    fn acquire(&self, request: &TicketRequest) -> PortResult<Ticket> {
        if self.refuse {
            return Err("kinit: Keytab contains no suitable keys".into());
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Ticket { cache: request.cache.clone() })
    }

    fn destroy(&self, _ticket: &Ticket) -> PortResult<()> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        if self.keep_cache {
            return Err("kdestroy: No credentials cache found".into());
        }
        Ok(())
    }
}

/// Entitlement service holding grants in memory.
#[derive(Default)]
pub struct FakeEntitlementService {
    rejected: Vec<String>,
    granted: Mutex<BTreeMap<String, Vec<String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeEntitlementService {
    /// Every mutation for `user` answers with HTTP 500.
    pub fn rejecting(mut self, user: &str) -> Self {
        self.rejected.push(user.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, method: &str, user: &str, entitlement: &str) -> PortResult<()> {
        self.calls.lock().unwrap().push(format!("{method} {user} {entitlement}"));
        if self.rejected.iter().any(|u| u == user) {
            return Err("HTTP 500".into());
        }
        Ok(())
    }
}

impl EntitlementService for FakeEntitlementService {
    fn grant(&self, _ticket: &Ticket, user: &str, entitlement: &str) -> PortResult<()> {
        self.call("grant", user, entitlement)?;
        let mut granted = self.granted.lock().unwrap();
        let held = granted.entry(user.to_string()).or_default();
        if !held.iter().any(|e| e == entitlement) {
            held.push(entitlement.to_string());
        }
        Ok(())
    }

    fn revoke(&self, _ticket: &Ticket, user: &str, entitlement: &str) -> PortResult<()> {
        self.call("revoke", user, entitlement)?;
        if let Some(held) = self.granted.lock().unwrap().get_mut(user) {
            held.retain(|e| e != entitlement);
        }
        Ok(())
    }

    fn list(&self, _ticket: &Ticket, user: &str) -> PortResult<Vec<String>> {
        Ok(self.granted.lock().unwrap().get(user).cloned().unwrap_or_default())
    }
}

// Shared handles let a test keep inspecting a fake after boxing it into a
// `ServiceContext`.

impl FileSystem for Arc<MemFs> {
    fn read_to_string(&self, path: &Path) -> PortResult<String> {
        self.as_ref().read_to_string(path)
    }

    fn replace(&self, path: &Path, contents: &str) -> PortResult<()> {
        self.as_ref().replace(path, contents)
    }
}

impl TicketIssuer for Arc<FakeIssuer> {
    fn acquire(&self, request: &TicketRequest) -> PortResult<Ticket> {
        self.as_ref().acquire(request)
    }

    fn destroy(&self, ticket: &Ticket) -> PortResult<()> {
        self.as_ref().destroy(ticket)
    }
}

impl EntitlementService for Arc<FakeEntitlementService> {
    fn grant(&self, ticket: &Ticket, user: &str, entitlement: &str) -> PortResult<()> {
        self.as_ref().grant(ticket, user, entitlement)
    }

    fn revoke(&self, ticket: &Ticket, user: &str, entitlement: &str) -> PortResult<()> {
        self.as_ref().revoke(ticket, user, entitlement)
    }

    fn list(&self, ticket: &Ticket, user: &str) -> PortResult<Vec<String>> {
        self.as_ref().list(ticket, user)
    }
}
