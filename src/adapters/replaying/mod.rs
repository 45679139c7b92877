//! Replaying adapters that serve recorded interactions.

pub mod clock;
pub mod credentials;
pub mod directory;
pub mod entitlements;
pub mod registry;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;

pub use clock::ReplayingClock;
pub use credentials::ReplayingTicketIssuer;
pub use directory::ReplayingDirectory;
pub use entitlements::ReplayingEntitlementService;
pub use registry::ReplayingCourseRegistry;

/// Takes the output of the next recorded call for `port::method`.
///
/// # Panics
///
/// Panics if the cassette has no further interaction for the pair.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut guard = replayer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    guard.next_interaction(port, method).output
}

/// Decodes an `{"ok": v}` / `{"err": msg}` output into a `Result`.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(err) = output.get("err") {
        return Err(err.as_str().unwrap_or("unknown error").to_string().into());
    }
    let value = output.get("ok").cloned().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|e| format!("malformed recorded output: {e}").into())
}
