//! Record-replay round-trip integration test.
//!
//! 1. Run `update` against in-memory ports wrapped in recording adapters.
//! 2. Replay the cassette through `ServiceContext::replaying()`.
//! 3. Assert identical output, then replay again for determinism.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use entsync::adapters::live::LiveFileSystem;
use entsync::adapters::recording::{
    RecordingClock, RecordingCourseRegistry, RecordingDirectory, RecordingEntitlementService,
    RecordingTicketIssuer,
};
use entsync::cassette::recorder::CassetteRecorder;
use entsync::commands::update;
use entsync::config::Settings;
use entsync::context::ServiceContext;
use entsync::error::Error;
use entsync::ports::{
    Clock, CourseRegistry, Directory, EntitlementService, RealmUsername, Ticket, TicketIssuer,
    TicketRequest,
};
use entsync::reconcile::RunMode;

type PortResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

struct Today;

impl Clock for Today {
    fn today(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 8, 14).unwrap()
    }
}

struct Ldap(HashMap<&'static str, Vec<&'static str>>);

impl Directory for Ldap {
    fn search(&self, filter: &str) -> PortResult<Vec<String>> {
        let users = self.0.get(filter).cloned().unwrap_or_default();
        Ok(users.into_iter().map(String::from).collect())
    }
}

struct Registry;

impl CourseRegistry for Registry {
    fn registered_students(&self, semester: &str, distance: bool) -> PortResult<Vec<String>> {
        Ok(match (semester, distance) {
            ("20232", false) => vec!["dana".to_string()],
            ("20211", true) => vec!["erik".to_string()],
            _ => Vec::new(),
        })
    }

    fn course_participants(&self, _course: &str) -> PortResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn person_usernames(&self, _person: &str) -> PortResult<Vec<RealmUsername>> {
        Ok(Vec::new())
    }
}

struct Kdc;

impl TicketIssuer for Kdc {
    fn acquire(&self, request: &TicketRequest) -> PortResult<Ticket> {
        Ok(Ticket { cache: request.cache.clone() })
    }

    fn destroy(&self, _ticket: &Ticket) -> PortResult<()> {
        Ok(())
    }
}

struct Service;

impl EntitlementService for Service {
    fn grant(&self, _ticket: &Ticket, user: &str, _entitlement: &str) -> PortResult<()> {
        if user == "erik" {
            return Err("HTTP 403".into());
        }
        Ok(())
    }

    fn revoke(&self, _ticket: &Ticket, _user: &str, _entitlement: &str) -> PortResult<()> {
        Ok(())
    }

    fn list(&self, _ticket: &Ticket, _user: &str) -> PortResult<Vec<String>> {
        Ok(Vec::new())
    }
}

const MAPPING: &str = "\
# managed by entsync
students = daisy:students
wiki     = user:alice
wiki     = ldap:(ou=staff)
";

fn workspace() -> (PathBuf, Settings) {
    let dir = std::env::temp_dir().join(format!("entsync_record_replay_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("entmap.conf"), MAPPING).unwrap();
    let yaml = "\
entitlement_base: 'urn:mace:example.org:'
mapping_file: entmap.conf
directory: {url: 'ldap://localhost', bind_dn: 'cn=test', base_dn: 'dc=example,dc=org'}
course_registry: {url: 'http://localhost', user: test, department: 4, realm: EXAMPLE.ORG}
entitlement_api: {url: 'http://localhost/api/user', principal: 'svc@EXAMPLE.ORG', keytab: svc.keytab}
";
    let settings = Settings::from_yaml(yaml, &dir).unwrap();
    (dir, settings)
}

fn run_update(ctx: &ServiceContext, settings: &Settings) -> (String, Option<usize>) {
    let mut out = Vec::new();
    let failed = match update::run(ctx, settings, &[], RunMode::default(), &mut out) {
        Ok(()) => None,
        Err(Error::OperationsFailed(n)) => Some(n),
        Err(e) => panic!("unexpected error: {e}"),
    };
    (String::from_utf8(out).unwrap(), failed)
}

#[test]
fn record_then_replay_produces_identical_outputs() {
    let (dir, settings) = workspace();
    let cassette_path = dir.join("update.cassette.yaml");

    // --- Phase 1: Record a full update ---
    let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "update")));
    let ldap = Ldap(HashMap::from([
        ("(eduPersonEntitlement=urn:mace:example.org:wiki)", vec!["mallory", "bob"]),
        ("(eduPersonEntitlement=urn:mace:example.org:students)", vec!["dana", "frank"]),
        ("(ou=staff)", vec!["bob"]),
    ]));
    let recording = ServiceContext::from_ports(
        Box::new(RecordingClock::new(Box::new(Today), Arc::clone(&recorder))),
        Box::new(LiveFileSystem),
        Box::new(RecordingDirectory::new(Box::new(ldap), Arc::clone(&recorder))),
        Box::new(RecordingCourseRegistry::new(Box::new(Registry), Arc::clone(&recorder))),
        Box::new(RecordingTicketIssuer::new(Box::new(Kdc), Arc::clone(&recorder))),
        Box::new(RecordingEntitlementService::new(Box::new(Service), Arc::clone(&recorder))),
    );
    let recorded = run_update(&recording, &settings);
    recorder.lock().unwrap().write().expect("cassette written");

    assert_eq!(recorded.0, "students add erik: HTTP 403\n");
    assert_eq!(recorded.1, Some(1));

    // --- Phase 2: Replay and verify identical outputs ---
    let first = run_update(&ServiceContext::replaying(&cassette_path).unwrap(), &settings);
    assert_eq!(first, recorded, "replay differs from recording");

    // --- Phase 3: Replay a second time for determinism ---
    let second = run_update(&ServiceContext::replaying(&cassette_path).unwrap(), &settings);
    assert_eq!(first, second, "replays differ");

    // update never rewrites the declaration file
    assert_eq!(std::fs::read_to_string(dir.join("entmap.conf")).unwrap(), MAPPING);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replaying_missing_cassette_is_config_error() {
    let err = ServiceContext::replaying(Path::new("/nonexistent/run.cassette.yaml")).err();
    assert!(err.is_some_and(|e| e.is_config()));
}
