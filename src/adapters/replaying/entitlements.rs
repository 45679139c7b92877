//! Replaying adapter for the `EntitlementService` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{EntitlementService, Ticket};

/// Serves recorded entitlement service calls from a cassette.
pub struct ReplayingEntitlementService {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingEntitlementService {
    /// Creates a replaying service backed by `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl EntitlementService for ReplayingEntitlementService {
    fn grant(
        &self,
        _ticket: &Ticket,
        _user: &str,
        _entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "entitlements", "grant"))
    }

    fn revoke(
        &self,
        _ticket: &Ticket,
        _user: &str,
        _entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "entitlements", "revoke"))
    }

    fn list(
        &self,
        _ticket: &Ticket,
        _user: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "entitlements", "list"))
    }
}
