//! Recording adapters that capture interactions to a cassette.

pub mod clock;
pub mod credentials;
pub mod directory;
pub mod entitlements;
pub mod registry;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

pub use clock::RecordingClock;
pub use credentials::RecordingTicketIssuer;
pub use directory::RecordingDirectory;
pub use entitlements::RecordingEntitlementService;
pub use registry::RecordingCourseRegistry;

/// Records an interaction with a plain (non-`Result`) return value.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let input = serde_json::to_value(input).unwrap_or(serde_json::Value::Null);
    let output = serde_json::to_value(output).unwrap_or(serde_json::Value::Null);
    if let Ok(mut guard) = recorder.lock() {
        guard.record(port, method, input, output);
    }
}

/// Records a `Result` interaction.
///
/// `Ok(v)` is stored as `{"ok": v}` and `Err(e)` as `{"err": e.to_string()}`,
/// the shape `replaying::replay_result` reads back.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let output = match result {
        Ok(v) => serde_json::json!({ "ok": v }),
        Err(e) => serde_json::json!({ "err": e.to_string() }),
    };
    record_interaction(recorder, port, method, input, &output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::{ReplayingDirectory, ReplayingTicketIssuer};
    use crate::cassette::format::Cassette;
    use crate::cassette::replayer::CassetteReplayer;
    use crate::ports::{Directory, TicketIssuer, TicketRequest};
    use crate::testing::{FakeDirectory, FakeIssuer};

    #[test]
    fn recorded_answers_replay_identically() {
        let dir = std::env::temp_dir().join(format!("entsync_recording_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "unit")));

        let directory = RecordingDirectory::new(
            Box::new(FakeDirectory::default().with("(uid=a)", &["a"]).failing("(uid=b)", "down")),
            Arc::clone(&recorder),
        );
        let issuer =
            RecordingTicketIssuer::new(Box::new(FakeIssuer::default()), Arc::clone(&recorder));
        let request = TicketRequest {
            principal: "svc@EXAMPLE.ORG".into(),
            keytab: "svc.keytab".into(),
            cache: "ent-cache".into(),
        };
        let ticket = issuer.acquire(&request).unwrap();
        assert_eq!(directory.search("(uid=a)").unwrap(), ["a"]);
        assert!(directory.search("(uid=b)").is_err());
        recorder.lock().unwrap().write().unwrap();

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.interactions.len(), 3);
        assert_eq!(cassette.interactions[1].input, serde_json::json!({"filter": "(uid=a)"}));

        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));
        let replayed_issuer = ReplayingTicketIssuer::new(Arc::clone(&replayer));
        let replayed = ReplayingDirectory::new(replayer);
        assert_eq!(replayed_issuer.acquire(&request).unwrap(), ticket);
        assert_eq!(replayed.search("(uid=a)").unwrap(), ["a"]);
        assert_eq!(replayed.search("(uid=b)").unwrap_err().to_string(), "down");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
